// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-element visibility
//!
//! Elements are visible unless listed as hidden. Isolation is not stored:
//! it hides the complement of a snapshot and is undone by showing all.

use crate::selection::SelectionSet;
use frag_viewer_model::{ElementId, Model, ModelId};
use rustc_hash::{FxHashMap, FxHashSet};

/// Hidden elements grouped by model
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisibilityState {
    hidden: FxHashMap<ModelId, FxHashSet<ElementId>>,
}

impl VisibilityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self, model: ModelId, element: ElementId) -> bool {
        !self
            .hidden
            .get(&model)
            .is_some_and(|set| set.contains(&element))
    }

    /// Set one element's visibility; returns whether it changed
    pub fn set_visible(&mut self, model: ModelId, element: ElementId, visible: bool) -> bool {
        if visible {
            let Some(set) = self.hidden.get_mut(&model) else {
                return false;
            };
            let changed = set.remove(&element);
            if set.is_empty() {
                self.hidden.remove(&model);
            }
            changed
        } else {
            self.hidden.entry(model).or_default().insert(element)
        }
    }

    /// Flip each element from its own current state
    ///
    /// Elements absent from the model are skipped and repeated ids flip
    /// once. Returns the number of elements flipped.
    pub fn toggle(&mut self, model: &Model, ids: impl IntoIterator<Item = ElementId>) -> usize {
        let mut seen = FxHashSet::default();
        let mut flipped = 0;
        for id in ids {
            if !seen.insert(id) {
                continue;
            }
            if !model.contains(id) {
                log::debug!("toggle: skipping {}{} (not in model)", model.id(), id);
                continue;
            }
            let visible = self.is_visible(model.id(), id);
            self.set_visible(model.id(), id, !visible);
            flipped += 1;
        }
        flipped
    }

    /// Show exactly the snapshot's elements across `models`, hide the rest
    ///
    /// Snapshot entries that do not resolve to an element of `models` are
    /// ignored. When nothing resolves, visibility is left untouched.
    /// Returns whether anything changed.
    pub fn isolate<'a>(
        &mut self,
        models: impl IntoIterator<Item = &'a Model>,
        snapshot: &SelectionSet,
    ) -> bool {
        let models: Vec<&Model> = models.into_iter().collect();
        let resolves = snapshot.keys().any(|key| {
            models
                .iter()
                .any(|m| m.id() == key.model && m.contains(key.element))
        });
        if !resolves {
            log::debug!("isolate: empty snapshot, visibility unchanged");
            return false;
        }

        let mut next: FxHashMap<ModelId, FxHashSet<ElementId>> = FxHashMap::default();
        for model in &models {
            let hidden: FxHashSet<ElementId> = model
                .element_ids()
                .filter(|id| !snapshot.contains(model.id(), *id))
                .collect();
            if !hidden.is_empty() {
                next.insert(model.id(), hidden);
            }
        }

        let changed = next != self.hidden;
        self.hidden = next;
        changed
    }

    /// Make every element visible; returns whether anything was hidden
    pub fn show_all(&mut self) -> bool {
        let had_hidden = !self.hidden.is_empty();
        self.hidden.clear();
        had_hidden
    }

    /// Forget a model's visibility state
    pub fn remove_model(&mut self, model: ModelId) -> bool {
        self.hidden.remove(&model).is_some()
    }

    /// Hidden elements of a model, sorted
    pub fn hidden(&self, model: ModelId) -> Vec<ElementId> {
        let mut ids: Vec<_> = self
            .hidden
            .get(&model)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Total number of hidden elements
    pub fn hidden_count(&self) -> usize {
        self.hidden.values().map(|s| s.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frag_viewer_model::{Element, ElementKey, ModelData};

    fn model(id: u32, elements: u32) -> Model {
        let mut data = ModelData::new("m", false);
        for e in 1..=elements {
            data = data.with_element(Element::new(e, "IFCWALL"));
        }
        Model::new(ModelId(id), data, Vec::new())
    }

    #[test]
    fn test_mixed_toggle_flips_independently() {
        let m = model(1, 2);
        let (a, b) = (ElementId(1), ElementId(2));
        let mut visibility = VisibilityState::new();
        visibility.set_visible(m.id(), b, false);

        assert_eq!(visibility.toggle(&m, [a, b]), 2);
        assert!(!visibility.is_visible(m.id(), a));
        assert!(visibility.is_visible(m.id(), b));
    }

    #[test]
    fn test_toggle_skips_missing() {
        let m = model(1, 2);
        let mut visibility = VisibilityState::new();
        assert_eq!(visibility.toggle(&m, [ElementId(1), ElementId(50)]), 1);
        assert!(visibility.is_visible(m.id(), ElementId(50)));
        assert_eq!(visibility.hidden_count(), 1);
    }

    #[test]
    fn test_toggle_repeated_id_flips_once() {
        let m = model(1, 2);
        let a = ElementId(1);
        let mut visibility = VisibilityState::new();
        assert_eq!(visibility.toggle(&m, [a, a]), 1);
        assert!(!visibility.is_visible(m.id(), a));

        assert_eq!(visibility.toggle(&m, [a, a, a]), 1);
        assert!(visibility.is_visible(m.id(), a));
        assert_eq!(visibility.hidden_count(), 0);
    }

    #[test]
    fn test_isolate_hides_complement_across_models() {
        let a = model(1, 3);
        let b = model(2, 2);
        let mut visibility = VisibilityState::new();
        let snapshot: SelectionSet = [ElementKey::new(a.id(), ElementId(2))].into_iter().collect();

        assert!(visibility.isolate([&a, &b], &snapshot));
        assert!(visibility.is_visible(a.id(), ElementId(2)));
        assert_eq!(visibility.hidden(a.id()), vec![ElementId(1), ElementId(3)]);
        assert_eq!(visibility.hidden(b.id()), vec![ElementId(1), ElementId(2)]);
    }

    #[test]
    fn test_isolate_shows_hidden_snapshot_members() {
        let a = model(1, 2);
        let mut visibility = VisibilityState::new();
        visibility.set_visible(a.id(), ElementId(1), false);
        let snapshot: SelectionSet = [ElementKey::new(a.id(), ElementId(1))].into_iter().collect();
        visibility.isolate([&a], &snapshot);
        assert!(visibility.is_visible(a.id(), ElementId(1)));
        assert!(!visibility.is_visible(a.id(), ElementId(2)));
    }

    #[test]
    fn test_isolate_empty_is_noop() {
        let a = model(1, 3);
        let mut visibility = VisibilityState::new();
        visibility.set_visible(a.id(), ElementId(3), false);
        let before = visibility.clone();

        assert!(!visibility.isolate([&a], &SelectionSet::new()));
        assert_eq!(visibility, before);

        // A snapshot naming only unknown elements resolves to nothing
        let stale: SelectionSet = [ElementKey::new(ModelId(9), ElementId(1))].into_iter().collect();
        assert!(!visibility.isolate([&a], &stale));
        assert_eq!(visibility, before);
    }

    #[test]
    fn test_show_all_after_isolate() {
        let a = model(1, 4);
        let mut visibility = VisibilityState::new();
        let snapshot: SelectionSet = [ElementKey::new(a.id(), ElementId(4))].into_iter().collect();
        visibility.isolate([&a], &snapshot);
        assert!(visibility.show_all());
        assert!(a.element_ids().all(|id| visibility.is_visible(a.id(), id)));
        assert!(!visibility.show_all());
    }
}
