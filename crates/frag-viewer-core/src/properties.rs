// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property lookups for the element property panel

use crate::indexer::RelationGraph;
use frag_viewer_model::{
    Element, ElementId, Model, Property, PropertySet, PropertyValue, RelationKind,
};
use std::collections::BTreeMap;

/// Name of the set holding an element's own attributes
pub const ATTRIBUTES_SET: &str = "Attributes";

/// Flat property mapping of one element
///
/// Holds `Entity`, `Name` and `GlobalId` when present, plus every own
/// property. Empty if the element does not exist.
pub fn get_properties(model: &Model, element: ElementId) -> BTreeMap<String, PropertyValue> {
    let Some(element) = model.element(element) else {
        return BTreeMap::new();
    };
    let mut map = element.properties.clone();
    for property in header_properties(element) {
        map.insert(property.name, property.value);
    }
    map
}

fn header_properties(element: &Element) -> Vec<Property> {
    let mut header = vec![Property::new("Entity", element.entity_type.as_str())];
    if let Some(name) = &element.name {
        header.push(Property::new("Name", name.as_str()));
    }
    if let Some(global_id) = &element.global_id {
        header.push(Property::new("GlobalId", global_id.as_str()));
    }
    header
}

fn to_set(name: impl Into<String>, properties: impl IntoIterator<Item = Property>) -> PropertySet {
    let mut set = PropertySet::new(name);
    for property in properties {
        set.add(property);
    }
    set
}

/// Property sets shown for an element
///
/// The first set holds the element's own attributes; it is followed by
/// every property set attached through `has-property-set` relations, in
/// relation order. Sets with no match for `query` are left out.
pub fn property_table(
    model: &Model,
    graph: Option<&RelationGraph>,
    element: ElementId,
    query: Option<&str>,
) -> Vec<PropertySet> {
    let Some(element) = model.element(element) else {
        return Vec::new();
    };

    let own = element
        .properties
        .iter()
        .map(|(name, value)| Property::new(name.as_str(), value.clone()));
    let mut sets = vec![to_set(
        ATTRIBUTES_SET,
        header_properties(element).into_iter().chain(own),
    )];

    let attached = graph
        .map(|g| g.get(element.id, RelationKind::HasPropertySet))
        .unwrap_or_default();
    for pset in attached.iter().filter_map(|id| model.element(*id)) {
        let properties = pset
            .properties
            .iter()
            .map(|(name, value)| Property::new(name.as_str(), value.clone()));
        sets.push(to_set(pset.label(), properties));
    }

    match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => sets.iter().filter_map(|s| s.filtered(q)).collect(),
        None => sets,
    }
}
