// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Elements, decoded model payloads, and registered models

use crate::{CodecError, DeclaredRelation, ElementId, ModelId, PropertyValue, RelationKind};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single addressable unit within a model (a wall, a door, a property set)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Identifier, unique within the model
    pub id: ElementId,
    /// Declared entity type (e.g., "IFCWALL")
    pub entity_type: String,
    /// Name attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// GlobalId attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_id: Option<String>,
    /// Own property values, ordered by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertyValue>,
    /// Outgoing relations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<DeclaredRelation>,
}

impl Element {
    /// Create a new element
    pub fn new(id: impl Into<ElementId>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            name: None,
            global_id: None,
            properties: BTreeMap::new(),
            relations: Vec::new(),
        }
    }

    /// Set name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set GlobalId
    pub fn with_global_id(mut self, global_id: impl Into<String>) -> Self {
        self.global_id = Some(global_id.into());
        self
    }

    /// Add a property value
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Add an outgoing relation
    pub fn with_relation(
        mut self,
        kind: RelationKind,
        targets: impl IntoIterator<Item = ElementId>,
    ) -> Self {
        self.relations.push(DeclaredRelation::new(kind, targets));
        self
    }

    /// Display label: name if present, otherwise type and id
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("{} {}", self.entity_type, self.id),
        }
    }
}

/// Decoded model content, before the registry assigns an identifier
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelData {
    /// Model name (usually the source file name)
    #[serde(default)]
    pub name: String,
    /// Whether property and relation data is present; carried in the fragment header
    #[serde(skip)]
    pub has_properties: bool,
    /// Elements in declaration order
    pub elements: Vec<Element>,
}

impl ModelData {
    /// Create an empty payload
    pub fn new(name: impl Into<String>, has_properties: bool) -> Self {
        Self {
            name: name.into(),
            has_properties,
            elements: Vec::new(),
        }
    }

    /// Add an element
    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    /// Check the invariants every stored model upholds
    ///
    /// Element identifiers are unique and every real value is finite, so
    /// the content survives an encode/decode cycle unchanged.
    pub fn validate(&self) -> crate::Result<()> {
        let mut seen = rustc_hash::FxHashSet::default();
        for element in &self.elements {
            if !seen.insert(element.id) {
                return Err(CodecError::DuplicateElement(element.id));
            }
            let non_finite = element
                .properties
                .iter()
                .find(|(_, value)| matches!(value, PropertyValue::Real(r) if !r.is_finite()));
            if let Some((name, _)) = non_finite {
                return Err(CodecError::NonFinite {
                    element: element.id,
                    property: name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A registered model - immutable after load
///
/// Owned by the registry; everything else refers to it by [`ModelId`].
/// The fragment buffer it was decoded from is kept so export never has to
/// re-encode.
#[derive(Debug)]
pub struct Model {
    id: ModelId,
    data: ModelData,
    index: FxHashMap<ElementId, usize>,
    buffer: Vec<u8>,
}

impl Model {
    /// Build a model from decoded content and the native buffer it came from
    pub fn new(id: ModelId, data: ModelData, buffer: Vec<u8>) -> Self {
        let index = data
            .elements
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, i))
            .collect();
        Self {
            id,
            data,
            index,
            buffer,
        }
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn has_properties(&self) -> bool {
        self.data.has_properties
    }

    /// Elements in declaration order
    pub fn elements(&self) -> &[Element] {
        &self.data.elements
    }

    /// Get element by ID
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.index.get(&id).map(|&i| &self.data.elements[i])
    }

    /// Check if an element exists
    pub fn contains(&self, id: ElementId) -> bool {
        self.index.contains_key(&id)
    }

    /// All element IDs in declaration order
    pub fn element_ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.data.elements.iter().map(|e| e.id)
    }

    pub fn element_count(&self) -> usize {
        self.data.elements.len()
    }

    /// Native fragment buffer this model was loaded from
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Decoded content
    pub fn data(&self) -> &ModelData {
        &self.data
    }
}
