// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relation indexer - per-model graph of element relations
//!
//! The graph is derived once from the relations elements declare and is
//! never mutated afterwards; re-indexing replaces it wholesale. Every
//! declared relation is stored together with its inverse.

use frag_viewer_model::{ElementId, Model, ModelId, RelationKind};
use rustc_hash::{FxHashMap, FxHashSet};

/// Queryable relations of one model
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelationGraph {
    /// (source, kind) -> ordered targets
    edges: FxHashMap<(ElementId, RelationKind), Vec<ElementId>>,
    /// Kinds present at least once
    kinds: FxHashSet<RelationKind>,
}

impl RelationGraph {
    /// Build the graph from a model's declared relations
    ///
    /// Models without property data yield an empty graph. Targets that do
    /// not exist in the model are dropped.
    pub fn build(model: &Model) -> Self {
        let mut graph = RelationGraph::default();
        if !model.has_properties() {
            return graph;
        }

        for element in model.elements() {
            for relation in &element.relations {
                for &target in &relation.targets {
                    if !model.contains(target) {
                        log::debug!(
                            "{}: dropping {} {} -> {} (missing target)",
                            model.id(),
                            relation.kind,
                            element.id,
                            target
                        );
                        continue;
                    }
                    graph.link(element.id, relation.kind, target);
                    graph.link(target, relation.kind.inverse(), element.id);
                }
            }
        }
        graph
    }

    fn link(&mut self, source: ElementId, kind: RelationKind, target: ElementId) {
        let targets = self.edges.entry((source, kind)).or_default();
        if !targets.contains(&target) {
            targets.push(target);
        }
        self.kinds.insert(kind);
    }

    /// Targets of one relation kind, in declaration order
    pub fn get(&self, element: ElementId, kind: RelationKind) -> &[ElementId] {
        self.edges
            .get(&(element, kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any relation of this kind exists
    pub fn has_kind(&self, kind: RelationKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Whether the graph carries spatial containment
    pub fn has_containment(&self) -> bool {
        self.has_kind(RelationKind::IsContainedIn)
    }

    /// Number of (source, kind) entries
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Owner of every model's relation graph
#[derive(Debug, Default)]
pub struct RelationIndexer {
    graphs: FxHashMap<ModelId, RelationGraph>,
}

impl RelationIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a graph built elsewhere, replacing any previous one
    pub fn insert(&mut self, model: ModelId, graph: RelationGraph) {
        log::debug!("{}: indexed {} relation entries", model, graph.len());
        self.graphs.insert(model, graph);
    }

    /// Relation targets; empty when the model, element or kind has none
    pub fn get_relations(
        &self,
        model: ModelId,
        element: ElementId,
        kind: RelationKind,
    ) -> Vec<ElementId> {
        self.graphs
            .get(&model)
            .map(|g| g.get(element, kind).to_vec())
            .unwrap_or_default()
    }

    /// Graph of a model, if it has been indexed
    pub fn graph(&self, model: ModelId) -> Option<&RelationGraph> {
        self.graphs.get(&model)
    }

    pub fn is_indexed(&self, model: ModelId) -> bool {
        self.graphs.contains_key(&model)
    }

    /// Drop a model's graph
    pub fn remove(&mut self, model: ModelId) -> bool {
        self.graphs.remove(&model).is_some()
    }
}
