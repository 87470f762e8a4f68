// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model registry - owns every loaded model
//!
//! A load first reserves an identifier (pending), decodes without holding
//! any lock, then commits. Identifiers of pending loads are not visible
//! through [`ModelRegistry::get`]. A dispose aimed at a pending load is
//! deferred and applied the moment the load commits.

use frag_viewer_model::{Model, ModelData, ModelId};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Outcome of removing a model
#[derive(Debug)]
pub enum Removal {
    /// Model was registered and is now gone
    Removed(Arc<Model>),
    /// Model is still loading; it will be disposed when the load completes
    Deferred,
    /// Nothing registered or pending under that identifier
    Unknown,
}

#[derive(Debug, Default)]
struct PendingLoad {
    dispose_on_complete: bool,
}

/// Set of registered models keyed by [`ModelId`]
#[derive(Debug)]
pub struct ModelRegistry {
    models: FxHashMap<ModelId, Arc<Model>>,
    /// Registration order, for deterministic iteration
    order: Vec<ModelId>,
    pending: FxHashMap<ModelId, PendingLoad>,
    /// `None` once every identifier has been handed out
    next_id: Option<u32>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            models: FxHashMap::default(),
            order: Vec::new(),
            pending: FxHashMap::default(),
            next_id: Some(1),
        }
    }

    /// Reserve a fresh identifier for a load that is about to decode
    ///
    /// Returns `None` when the identifier space is exhausted.
    pub fn reserve(&mut self) -> Option<ModelId> {
        let id = ModelId(self.next_id?);
        self.next_id = id.0.checked_add(1);
        self.pending.insert(id, PendingLoad::default());
        Some(id)
    }

    /// Register a decoded model under a reserved identifier
    ///
    /// Returns `None` when a dispose arrived while the load was in flight;
    /// the model is dropped instead of registered.
    pub fn commit(&mut self, id: ModelId, data: ModelData, buffer: Vec<u8>) -> Option<Arc<Model>> {
        let pending = self.pending.remove(&id).unwrap_or_default();
        if pending.dispose_on_complete {
            return None;
        }
        let model = Arc::new(Model::new(id, data, buffer));
        self.models.insert(id, model.clone());
        self.order.push(id);
        Some(model)
    }

    /// Forget a reservation whose load failed
    pub fn abort(&mut self, id: ModelId) {
        self.pending.remove(&id);
    }

    /// Remove a model, or defer removal if it is still loading
    pub fn remove(&mut self, id: ModelId) -> Removal {
        if let Some(model) = self.models.remove(&id) {
            self.order.retain(|m| *m != id);
            return Removal::Removed(model);
        }
        match self.pending.get_mut(&id) {
            Some(pending) => {
                pending.dispose_on_complete = true;
                Removal::Deferred
            }
            None => Removal::Unknown,
        }
    }

    /// Mark every in-flight load for disposal on completion
    ///
    /// Returns the number of loads affected.
    pub fn defer_pending(&mut self) -> usize {
        for pending in self.pending.values_mut() {
            pending.dispose_on_complete = true;
        }
        self.pending.len()
    }

    /// Get a registered model
    pub fn get(&self, id: ModelId) -> Option<Arc<Model>> {
        self.models.get(&id).cloned()
    }

    /// Borrow a registered model
    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.get(&id).map(|m| m.as_ref())
    }

    pub fn contains(&self, id: ModelId) -> bool {
        self.models.contains_key(&id)
    }

    pub fn is_pending(&self, id: ModelId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Registered identifiers in load order
    pub fn ids(&self) -> Vec<ModelId> {
        self.order.clone()
    }

    /// Registered models in load order
    pub fn iter(&self) -> impl Iterator<Item = &Model> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.models.get(id).map(|m| m.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frag_viewer_model::Element;

    fn data() -> ModelData {
        ModelData::new("m", false).with_element(Element::new(1, "IFCWALL"))
    }

    #[test]
    fn test_reserve_then_commit() {
        let mut registry = ModelRegistry::new();
        let id = registry.reserve().unwrap();
        assert!(registry.is_pending(id));
        assert!(registry.get(id).is_none());

        let model = registry.commit(id, data(), vec![7]).unwrap();
        assert_eq!(model.id(), id);
        assert!(!registry.is_pending(id));
        assert!(registry.contains(id));
        assert_eq!(registry.ids(), vec![id]);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut registry = ModelRegistry::new();
        let a = registry.reserve().unwrap();
        registry.commit(a, data(), Vec::new());
        assert!(matches!(registry.remove(a), Removal::Removed(_)));
        let b = registry.reserve().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_dispose_during_load_is_deferred() {
        let mut registry = ModelRegistry::new();
        let id = registry.reserve().unwrap();
        assert!(matches!(registry.remove(id), Removal::Deferred));
        assert!(registry.commit(id, data(), Vec::new()).is_none());
        assert!(!registry.contains(id));
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn test_dispose_of_failed_load_is_noop() {
        let mut registry = ModelRegistry::new();
        let id = registry.reserve().unwrap();
        registry.remove(id);
        registry.abort(id);
        assert!(matches!(registry.remove(id), Removal::Unknown));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_defer_pending() {
        let mut registry = ModelRegistry::new();
        let loaded = registry.reserve().unwrap();
        registry.commit(loaded, data(), Vec::new());
        let in_flight = registry.reserve().unwrap();

        assert_eq!(registry.defer_pending(), 1);
        assert!(registry.commit(in_flight, data(), Vec::new()).is_none());
        // Already registered models are untouched by deferral
        assert!(registry.contains(loaded));
    }

    #[test]
    fn test_iteration_follows_load_order() {
        let mut registry = ModelRegistry::new();
        let ids: Vec<_> = (0..3).map(|_| registry.reserve().unwrap()).collect();
        for id in ids.iter().rev() {
            registry.commit(*id, data(), Vec::new());
        }
        let order: Vec<_> = registry.iter().map(|m| m.id()).collect();
        assert_eq!(order, ids.iter().rev().copied().collect::<Vec<_>>());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_reserve_stops_when_ids_run_out() {
        let mut registry = ModelRegistry::new();
        registry.next_id = Some(u32::MAX);
        let last = registry.reserve().unwrap();
        assert_eq!(last, ModelId(u32::MAX));
        assert!(registry.reserve().is_none());
        assert!(registry.reserve().is_none());
        assert_eq!(registry.pending_count(), 1);
    }
}
