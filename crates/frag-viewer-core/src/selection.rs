// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selection set - selected elements grouped by model

use frag_viewer_model::{ElementId, ElementKey, Model, ModelId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How a selection request combines with the current selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SelectMode {
    /// Clear everything, then select
    #[default]
    Replace,
    /// Union with the current selection
    Add,
    /// Difference with the current selection
    Remove,
}

/// Mapping of model → selected element ids
///
/// Never holds an empty per-model set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    entries: BTreeMap<ModelId, BTreeSet<ElementId>>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a selection request against a model
    ///
    /// `model` is `None` when the identifier is not registered; every
    /// requested element is then skipped, as is any element the model does
    /// not contain. Replace still clears the prior selection. Returns whether
    /// the selection changed.
    pub fn apply(
        &mut self,
        model_id: ModelId,
        model: Option<&Model>,
        ids: impl IntoIterator<Item = ElementId>,
        mode: SelectMode,
    ) -> bool {
        let before = if mode == SelectMode::Replace {
            Some(std::mem::take(&mut self.entries))
        } else {
            None
        };

        let mut changed = false;
        for id in ids {
            let present = model.is_some_and(|m| m.contains(id));
            if !present {
                log::debug!("select: skipping {}{} (not registered)", model_id, id);
                continue;
            }
            changed |= match mode {
                SelectMode::Replace | SelectMode::Add => self.insert(model_id, id),
                SelectMode::Remove => self.remove(model_id, id),
            };
        }

        match before {
            Some(previous) => previous != self.entries,
            None => changed,
        }
    }

    /// Add one element; returns whether it was newly inserted
    pub fn insert(&mut self, model: ModelId, element: ElementId) -> bool {
        self.entries.entry(model).or_default().insert(element)
    }

    /// Remove one element; returns whether it was selected
    pub fn remove(&mut self, model: ModelId, element: ElementId) -> bool {
        let Some(set) = self.entries.get_mut(&model) else {
            return false;
        };
        let removed = set.remove(&element);
        if set.is_empty() {
            self.entries.remove(&model);
        }
        removed
    }

    /// Drop every entry of a model; returns whether anything was removed
    pub fn clear_model(&mut self, model: ModelId) -> bool {
        self.entries.remove(&model).is_some()
    }

    /// Empty the selection; returns whether anything was removed
    pub fn clear(&mut self) -> bool {
        let had_entries = !self.entries.is_empty();
        self.entries.clear();
        had_entries
    }

    pub fn contains(&self, model: ModelId, element: ElementId) -> bool {
        self.entries
            .get(&model)
            .is_some_and(|set| set.contains(&element))
    }

    /// Selected elements of one model
    pub fn elements(&self, model: ModelId) -> Option<&BTreeSet<ElementId>> {
        self.entries.get(&model)
    }

    /// Models with at least one selected element
    pub fn models(&self) -> impl Iterator<Item = ModelId> + '_ {
        self.entries.keys().copied()
    }

    /// Iterate (model, elements) pairs in model order
    pub fn iter(&self) -> impl Iterator<Item = (ModelId, &BTreeSet<ElementId>)> + '_ {
        self.entries.iter().map(|(m, set)| (*m, set))
    }

    /// Every selected element as a global key
    pub fn keys(&self) -> impl Iterator<Item = ElementKey> + '_ {
        self.entries
            .iter()
            .flat_map(|(m, set)| set.iter().map(move |e| ElementKey::new(*m, *e)))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of selected elements
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }
}

impl FromIterator<ElementKey> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = ElementKey>>(iter: T) -> Self {
        let mut set = SelectionSet::new();
        for key in iter {
            set.insert(key.model, key.element);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frag_viewer_model::{Element, ModelData};

    fn model(id: u32) -> Model {
        let mut data = ModelData::new("m", false);
        for e in 1..=5 {
            data = data.with_element(Element::new(e, "IFCWALL"));
        }
        Model::new(ModelId(id), data, Vec::new())
    }

    fn ids(raw: &[u32]) -> Vec<ElementId> {
        raw.iter().map(|&i| ElementId(i)).collect()
    }

    #[test]
    fn test_replace_then_add() {
        let m = model(1);
        let mut selection = SelectionSet::new();
        assert!(selection.apply(m.id(), Some(&m), ids(&[1, 2]), SelectMode::Replace));
        assert!(selection.apply(m.id(), Some(&m), ids(&[3]), SelectMode::Add));
        let selected: Vec<_> = selection.elements(m.id()).unwrap().iter().copied().collect();
        assert_eq!(selected, ids(&[1, 2, 3]));
    }

    #[test]
    fn test_remove_drops_empty_model_entry() {
        let m = model(1);
        let mut selection = SelectionSet::new();
        selection.apply(m.id(), Some(&m), ids(&[1]), SelectMode::Add);
        assert!(selection.apply(m.id(), Some(&m), ids(&[1, 4]), SelectMode::Remove));
        assert!(selection.is_empty());
        assert_eq!(selection.models().count(), 0);
    }

    #[test]
    fn test_replace_clears_other_models() {
        let a = model(1);
        let b = model(2);
        let mut selection = SelectionSet::new();
        selection.apply(a.id(), Some(&a), ids(&[1]), SelectMode::Add);
        selection.apply(b.id(), Some(&b), ids(&[2]), SelectMode::Replace);
        assert!(!selection.contains(a.id(), ElementId(1)));
        assert!(selection.contains(b.id(), ElementId(2)));
    }

    #[test]
    fn test_missing_elements_are_skipped() {
        let m = model(1);
        let mut selection = SelectionSet::new();
        selection.apply(m.id(), Some(&m), ids(&[1, 99, 2]), SelectMode::Replace);
        assert_eq!(selection.len(), 2);

        // Unknown model: nothing added, but replace still clears
        let changed = selection.apply(ModelId(9), None, ids(&[1]), SelectMode::Replace);
        assert!(changed);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_replace_with_same_set_reports_unchanged() {
        let m = model(1);
        let mut selection = SelectionSet::new();
        selection.apply(m.id(), Some(&m), ids(&[1, 2]), SelectMode::Replace);
        assert!(!selection.apply(m.id(), Some(&m), ids(&[2, 1]), SelectMode::Replace));
        assert!(!selection.apply(m.id(), Some(&m), ids(&[1]), SelectMode::Add));
    }

    #[test]
    fn test_keys_and_from_iter() {
        let keys = vec![
            ElementKey::new(ModelId(2), ElementId(1)),
            ElementKey::new(ModelId(1), ElementId(5)),
        ];
        let mut selection: SelectionSet = keys.iter().copied().collect();
        let collected: Vec<_> = selection.keys().collect();
        assert_eq!(collected, vec![keys[1], keys[0]]);
        assert_eq!(selection.len(), 2);
        assert!(selection.clear_model(ModelId(2)));
        assert!(!selection.clear_model(ModelId(2)));
        assert!(selection.clear());
        assert!(!selection.clear());
    }
}
