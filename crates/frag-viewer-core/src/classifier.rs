// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Classifier - groups model elements into classification trees
//!
//! Two systems are built per model: by declared entity type and by spatial
//! structure. The classifier keeps the latest tree of each system for each
//! model; rerunning a classification replaces the stored tree.

use crate::indexer::RelationGraph;
use frag_viewer_model::{ElementId, Model, ModelId, RelationKind, SpatialNodeType};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label of the single group produced when no containment is known
pub const UNCLASSIFIED_GROUP: &str = "All Elements";

/// Classification scheme
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassificationSystem {
    /// Grouped by declared entity type
    Entities,
    /// Grouped by spatial hierarchy (project, site, building, storey)
    SpatialStructures,
}

impl ClassificationSystem {
    pub const ALL: [ClassificationSystem; 2] = [
        ClassificationSystem::Entities,
        ClassificationSystem::SpatialStructures,
    ];

    /// Key used by the classification panel
    pub fn key(&self) -> &'static str {
        match self {
            ClassificationSystem::Entities => "entities",
            ClassificationSystem::SpatialStructures => "spatialStructures",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            ClassificationSystem::Entities => "Entities",
            ClassificationSystem::SpatialStructures => "Spatial Structures",
        }
    }
}

/// Labeled group in a classification tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationGroup {
    /// Display label
    pub label: String,
    /// Structure element this group stands for (spatial groups only)
    pub element: Option<ElementId>,
    /// Spatial node type (spatial groups only)
    pub node_type: Option<SpatialNodeType>,
    /// Elements placed directly in this group
    pub elements: Vec<ElementId>,
    /// Nested groups
    pub children: Vec<ClassificationGroup>,
}

impl ClassificationGroup {
    /// Create an empty group
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            element: None,
            node_type: None,
            elements: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Get total element count (recursive)
    pub fn element_count(&self) -> usize {
        self.elements.len()
            + self
                .children
                .iter()
                .map(|c| c.element_count())
                .sum::<usize>()
    }

    /// Iterate all groups (depth-first)
    pub fn iter(&self) -> GroupIter<'_> {
        GroupIter { stack: vec![self] }
    }

    /// Get all element IDs in this subtree
    pub fn element_ids(&self) -> Vec<ElementId> {
        self.iter()
            .flat_map(|g| g.elements.iter().copied())
            .collect()
    }
}

/// Iterator over groups (depth-first)
pub struct GroupIter<'a> {
    stack: Vec<&'a ClassificationGroup>,
}

impl<'a> Iterator for GroupIter<'a> {
    type Item = &'a ClassificationGroup;

    fn next(&mut self) -> Option<Self::Item> {
        let group = self.stack.pop()?;
        // Push in reverse so the first child comes out first
        for child in group.children.iter().rev() {
            self.stack.push(child);
        }
        Some(group)
    }
}

/// Classification tree of one model under one system
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationTree {
    pub model: ModelId,
    pub system: ClassificationSystem,
    pub label: String,
    /// Top-level groups
    pub groups: Vec<ClassificationGroup>,
}

impl ClassificationTree {
    fn new(model: ModelId, system: ClassificationSystem) -> Self {
        Self {
            model,
            system,
            label: system.label().to_string(),
            groups: Vec::new(),
        }
    }

    /// Find a group by label anywhere in the tree
    pub fn find(&self, label: &str) -> Option<&ClassificationGroup> {
        self.groups
            .iter()
            .flat_map(|g| g.iter())
            .find(|g| g.label == label)
    }

    /// Every classified element
    pub fn element_ids(&self) -> Vec<ElementId> {
        self.groups.iter().flat_map(|g| g.element_ids()).collect()
    }

    pub fn element_count(&self) -> usize {
        self.groups.iter().map(|g| g.element_count()).sum()
    }
}

/// Entry of the classification panel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationEntry {
    pub system: String,
    pub label: String,
}

/// Authoritative owner of every model's classification trees
#[derive(Debug, Default)]
pub struct Classifier {
    trees: FxHashMap<(ModelId, ClassificationSystem), ClassificationTree>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Systems offered to the classification panel
    pub fn classifications() -> Vec<ClassificationEntry> {
        ClassificationSystem::ALL
            .iter()
            .map(|s| ClassificationEntry {
                system: s.key().to_string(),
                label: s.label().to_string(),
            })
            .collect()
    }

    /// Group elements by declared entity type
    ///
    /// Groups are ordered by type name; elements keep declaration order.
    pub fn build_entity_tree(model: &Model) -> ClassificationTree {
        let mut by_type: BTreeMap<&str, Vec<ElementId>> = BTreeMap::new();
        for element in model.elements() {
            by_type
                .entry(element.entity_type.as_str())
                .or_default()
                .push(element.id);
        }

        let mut tree = ClassificationTree::new(model.id(), ClassificationSystem::Entities);
        tree.groups = by_type
            .into_iter()
            .map(|(entity_type, elements)| {
                let mut group = ClassificationGroup::new(entity_type);
                group.elements = elements;
                group
            })
            .collect();
        tree
    }

    /// Group elements by spatial hierarchy
    ///
    /// Without containment relations the result is a single group holding
    /// every element.
    pub fn build_spatial_tree(model: &Model, graph: Option<&RelationGraph>) -> ClassificationTree {
        let mut tree = ClassificationTree::new(model.id(), ClassificationSystem::SpatialStructures);

        let graph = match graph {
            Some(g) if g.has_containment() => g,
            _ => {
                let mut all = ClassificationGroup::new(UNCLASSIFIED_GROUP);
                all.elements = model.element_ids().collect();
                tree.groups.push(all);
                return tree;
            }
        };

        let mut builder = SpatialBuilder {
            model,
            graph,
            visited: FxHashSet::default(),
            assigned: FxHashSet::default(),
        };
        for element in model.elements() {
            let is_root = graph.get(element.id, RelationKind::Decomposes).is_empty()
                && graph.get(element.id, RelationKind::IsContainedIn).is_empty();
            if is_root && builder.is_structure(element.id) {
                if let Some(group) = builder.build_group(element.id) {
                    tree.groups.push(group);
                }
            }
        }
        tree
    }

    /// Store a tree, replacing the previous one of the same model and system
    pub fn insert(&mut self, tree: ClassificationTree) {
        log::debug!(
            "{}: classified {} elements under '{}'",
            tree.model,
            tree.element_count(),
            tree.system.key()
        );
        self.trees.insert((tree.model, tree.system), tree);
    }

    /// Current tree of a model under a system
    pub fn get(&self, model: ModelId, system: ClassificationSystem) -> Option<&ClassificationTree> {
        self.trees.get(&(model, system))
    }

    /// Systems a model has been classified under
    pub fn systems(&self, model: ModelId) -> Vec<ClassificationSystem> {
        ClassificationSystem::ALL
            .into_iter()
            .filter(|s| self.trees.contains_key(&(model, *s)))
            .collect()
    }

    /// Drop every tree of a model
    pub fn remove_model(&mut self, model: ModelId) -> bool {
        let before = self.trees.len();
        self.trees.retain(|(m, _), _| *m != model);
        self.trees.len() != before
    }
}

/// Helper struct for building the spatial tree
struct SpatialBuilder<'a> {
    model: &'a Model,
    graph: &'a RelationGraph,
    /// Structure elements already turned into groups
    visited: FxHashSet<ElementId>,
    /// Elements already placed in a group
    assigned: FxHashSet<ElementId>,
}

impl SpatialBuilder<'_> {
    fn is_declared_structure(&self, id: ElementId) -> bool {
        self.model
            .element(id)
            .map(|e| SpatialNodeType::from_entity_type(&e.entity_type).is_structure())
            .unwrap_or(false)
    }

    fn is_structure(&self, id: ElementId) -> bool {
        self.is_declared_structure(id)
            || !self.graph.get(id, RelationKind::Contains).is_empty()
            || !self.graph.get(id, RelationKind::IsDecomposedBy).is_empty()
    }

    fn build_group(&mut self, id: ElementId) -> Option<ClassificationGroup> {
        // Guards against cyclic aggregation
        if !self.visited.insert(id) {
            return None;
        }
        let element = self.model.element(id)?;

        let node_type = SpatialNodeType::from_entity_type(&element.entity_type);
        let label = match &element.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("{} {}", node_type.display_name(), id),
        };
        let mut group = ClassificationGroup::new(label);
        group.element = Some(id);
        group.node_type = Some(node_type);

        for &part in self.graph.get(id, RelationKind::IsDecomposedBy) {
            if self.is_structure(part) {
                if let Some(child) = self.build_group(part) {
                    group.children.push(child);
                }
            } else if self.assigned.insert(part) {
                group.elements.push(part);
            }
        }

        // Spaces and other structures placed in a storey nest as groups
        for &contained in self.graph.get(id, RelationKind::Contains) {
            if self.is_declared_structure(contained) {
                if let Some(child) = self.build_group(contained) {
                    group.children.push(child);
                }
            } else if self.assigned.insert(contained) {
                group.elements.push(contained);
            }
        }

        Some(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frag_viewer_model::{Element, ModelData};

    fn model(with_containment: bool) -> Model {
        let mut data = ModelData::new("tower", true)
            .with_element(Element::new(1, "IFCPROJECT").with_name("Test Project"))
            .with_element(
                Element::new(2, "IFCSITE")
                    .with_name("Site")
                    .with_relation(RelationKind::Decomposes, [ElementId(1)]),
            )
            .with_element(
                Element::new(3, "IFCBUILDINGSTOREY")
                    .with_name("Ground Floor")
                    .with_relation(RelationKind::Decomposes, [ElementId(2)]),
            );
        let mut wall = Element::new(10, "IFCWALL").with_name("Wall 1");
        let mut door = Element::new(11, "IFCDOOR");
        if with_containment {
            wall = wall.with_relation(RelationKind::IsContainedIn, [ElementId(3)]);
            door = door.with_relation(RelationKind::IsContainedIn, [ElementId(3)]);
        }
        data = data
            .with_element(wall)
            .with_element(door)
            .with_element(Element::new(12, "IFCWALL"));
        Model::new(ModelId(4), data, Vec::new())
    }

    #[test]
    fn test_entity_tree() {
        let tree = Classifier::build_entity_tree(&model(true));
        let labels: Vec<_> = tree.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["IFCBUILDINGSTOREY", "IFCDOOR", "IFCPROJECT", "IFCSITE", "IFCWALL"]
        );
        assert_eq!(
            tree.find("IFCWALL").unwrap().elements,
            vec![ElementId(10), ElementId(12)]
        );
        assert_eq!(tree.element_count(), 6);
    }

    #[test]
    fn test_spatial_tree_follows_hierarchy() {
        let m = model(true);
        let graph = RelationGraph::build(&m);
        let tree = Classifier::build_spatial_tree(&m, Some(&graph));

        assert_eq!(tree.groups.len(), 1);
        let project = &tree.groups[0];
        assert_eq!(project.label, "Test Project");
        assert_eq!(project.node_type, Some(SpatialNodeType::Project));

        let storey = tree.find("Ground Floor").unwrap();
        assert_eq!(storey.element, Some(ElementId(3)));
        assert_eq!(storey.elements, vec![ElementId(10), ElementId(11)]);
        // The uncontained wall stays out of the spatial tree
        assert_eq!(tree.element_ids(), vec![ElementId(10), ElementId(11)]);
    }

    #[test]
    fn test_spatial_fallback_without_containment() {
        let m = model(false);
        let graph = RelationGraph::build(&m);
        let tree = Classifier::build_spatial_tree(&m, Some(&graph));
        assert_eq!(tree.groups.len(), 1);
        assert_eq!(tree.groups[0].label, UNCLASSIFIED_GROUP);
        assert_eq!(tree.groups[0].elements.len(), m.element_count());
        assert!(tree.groups[0].children.is_empty());

        let without_graph = Classifier::build_spatial_tree(&m, None);
        assert_eq!(without_graph, tree);
    }

    #[test]
    fn test_element_in_at_most_one_group() {
        let data = ModelData::new("dup", true)
            .with_element(Element::new(1, "IFCBUILDINGSTOREY").with_name("A"))
            .with_element(Element::new(2, "IFCBUILDINGSTOREY").with_name("B"))
            .with_element(
                Element::new(10, "IFCWALL")
                    .with_relation(RelationKind::IsContainedIn, [ElementId(1), ElementId(2)]),
            );
        let m = Model::new(ModelId(1), data, Vec::new());
        let graph = RelationGraph::build(&m);
        let tree = Classifier::build_spatial_tree(&m, Some(&graph));
        let ids = tree.element_ids();
        assert_eq!(ids, vec![ElementId(10)]);
        assert!(tree.find("B").unwrap().elements.is_empty());
    }

    #[test]
    fn test_unnamed_structure_label() {
        let data = ModelData::new("unnamed", true)
            .with_element(Element::new(3, "IFCBUILDINGSTOREY"))
            .with_element(
                Element::new(10, "IFCSLAB").with_relation(RelationKind::IsContainedIn, [ElementId(3)]),
            );
        let m = Model::new(ModelId(1), data, Vec::new());
        let graph = RelationGraph::build(&m);
        let tree = Classifier::build_spatial_tree(&m, Some(&graph));
        assert_eq!(tree.groups[0].label, "Storey #3");
    }

    #[test]
    fn test_contained_space_nests_under_storey() {
        let data = ModelData::new("spaces", true)
            .with_element(Element::new(3, "IFCBUILDINGSTOREY").with_name("Level 1"))
            .with_element(
                Element::new(5, "IFCSPACE")
                    .with_name("Office")
                    .with_relation(RelationKind::IsContainedIn, [ElementId(3)]),
            )
            .with_element(
                Element::new(10, "IFCFURNISHINGELEMENT")
                    .with_relation(RelationKind::IsContainedIn, [ElementId(5)]),
            );
        let m = Model::new(ModelId(1), data, Vec::new());
        let graph = RelationGraph::build(&m);
        let tree = Classifier::build_spatial_tree(&m, Some(&graph));

        assert_eq!(tree.groups.len(), 1);
        let storey = &tree.groups[0];
        assert_eq!(storey.label, "Level 1");
        assert!(storey.elements.is_empty());
        assert_eq!(storey.children.len(), 1);
        let office = &storey.children[0];
        assert_eq!(office.element, Some(ElementId(5)));
        assert_eq!(office.elements, vec![ElementId(10)]);
    }

    #[test]
    fn test_cyclic_aggregation_terminates() {
        let data = ModelData::new("cycle", true)
            .with_element(Element::new(1, "IFCPROJECT"))
            .with_element(
                Element::new(2, "IFCSITE")
                    .with_relation(RelationKind::Decomposes, [ElementId(1)])
                    .with_relation(RelationKind::IsDecomposedBy, [ElementId(1)]),
            )
            .with_element(
                Element::new(3, "IFCWALL").with_relation(RelationKind::IsContainedIn, [ElementId(2)]),
            );
        let m = Model::new(ModelId(1), data, Vec::new());
        let graph = RelationGraph::build(&m);
        let tree = Classifier::build_spatial_tree(&m, Some(&graph));
        // Both structures decompose each other, so neither is a root
        assert!(tree.groups.is_empty());
    }

    #[test]
    fn test_reclassify_replaces() {
        let m = model(true);
        let graph = RelationGraph::build(&m);
        let mut classifier = Classifier::new();
        classifier.insert(Classifier::build_entity_tree(&m));
        classifier.insert(Classifier::build_spatial_tree(&m, Some(&graph)));
        let first = classifier
            .get(m.id(), ClassificationSystem::SpatialStructures)
            .cloned();

        classifier.insert(Classifier::build_spatial_tree(&m, Some(&graph)));
        assert_eq!(
            classifier
                .get(m.id(), ClassificationSystem::SpatialStructures)
                .cloned(),
            first
        );
        assert_eq!(classifier.systems(m.id()), ClassificationSystem::ALL.to_vec());

        assert!(classifier.remove_model(m.id()));
        assert!(classifier.get(m.id(), ClassificationSystem::Entities).is_none());
        assert!(classifier.systems(m.id()).is_empty());
    }

    #[test]
    fn test_classification_catalogue() {
        let entries = Classifier::classifications();
        assert_eq!(entries[0].system, "entities");
        assert_eq!(entries[1].label, "Spatial Structures");
    }
}
