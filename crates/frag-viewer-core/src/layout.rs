// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! View layout coordinator
//!
//! The layout is a pure function of the previous layout and one event, so
//! any layout can be reproduced by replaying the event log from
//! [`Layout::Main`].

use serde::{Deserialize, Serialize};

/// Named arrangement of UI panels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Main,
    Secondary,
    World,
    Classifier,
}

/// Panel shown by a layout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Panel {
    Toolbar,
    ElementProperties,
    WorldSettings,
    Classifier,
}

impl Layout {
    pub fn key(&self) -> &'static str {
        match self {
            Layout::Main => "main",
            Layout::Secondary => "secondary",
            Layout::World => "world",
            Layout::Classifier => "classifier",
        }
    }

    /// Panels arranged by this layout, in display order
    pub fn panels(&self) -> &'static [Panel] {
        match self {
            Layout::Main => &[Panel::Toolbar],
            Layout::Secondary => &[Panel::Toolbar, Panel::ElementProperties],
            Layout::World => &[Panel::Toolbar, Panel::WorldSettings],
            Layout::Classifier => &[Panel::Toolbar, Panel::Classifier],
        }
    }
}

/// Inputs that can move the layout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutEvent {
    /// Selection became (or stayed) non-empty
    Highlight,
    /// Selection became empty
    Clear,
    /// Classifier button
    ShowClassifier,
    /// World settings button
    ShowWorld,
}

/// Next layout after `event`
pub fn transition(current: Layout, event: LayoutEvent) -> Layout {
    match event {
        LayoutEvent::Highlight => Layout::Secondary,
        LayoutEvent::Clear => Layout::Main,
        LayoutEvent::ShowClassifier if current == Layout::Classifier => Layout::Main,
        LayoutEvent::ShowClassifier => Layout::Classifier,
        LayoutEvent::ShowWorld => Layout::World,
    }
}

/// Layout reached by applying `events` in order from the initial layout
pub fn replay(events: impl IntoIterator<Item = LayoutEvent>) -> Layout {
    events.into_iter().fold(Layout::default(), transition)
}

/// Holder of the current layout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutCoordinator {
    current: Layout,
}

impl LayoutCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Layout {
        self.current
    }

    /// Apply an event; returns the new layout if it changed
    pub fn apply(&mut self, event: LayoutEvent) -> Option<Layout> {
        let next = transition(self.current, event);
        if next == self.current {
            return None;
        }
        log::debug!("layout: {} -> {}", self.current.key(), next.key());
        self.current = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_events() {
        assert_eq!(transition(Layout::Main, LayoutEvent::Highlight), Layout::Secondary);
        assert_eq!(transition(Layout::Secondary, LayoutEvent::Clear), Layout::Main);
        assert_eq!(transition(Layout::World, LayoutEvent::Highlight), Layout::Secondary);
    }

    #[test]
    fn test_classifier_toggles() {
        assert_eq!(transition(Layout::Main, LayoutEvent::ShowClassifier), Layout::Classifier);
        assert_eq!(transition(Layout::Classifier, LayoutEvent::ShowClassifier), Layout::Main);
        assert_eq!(transition(Layout::Secondary, LayoutEvent::ShowClassifier), Layout::Classifier);
        assert_eq!(transition(Layout::Classifier, LayoutEvent::ShowWorld), Layout::World);
    }

    #[test]
    fn test_replay_matches_coordinator() {
        let log = [
            LayoutEvent::Highlight,
            LayoutEvent::ShowClassifier,
            LayoutEvent::ShowClassifier,
            LayoutEvent::ShowWorld,
            LayoutEvent::Highlight,
        ];
        let mut coordinator = LayoutCoordinator::new();
        for event in log {
            coordinator.apply(event);
        }
        assert_eq!(coordinator.current(), replay(log));
        assert_eq!(replay(log), Layout::Secondary);
        assert_eq!(replay([]), Layout::Main);
    }

    #[test]
    fn test_apply_reports_change_only() {
        let mut coordinator = LayoutCoordinator::new();
        assert_eq!(coordinator.apply(LayoutEvent::Clear), None);
        assert_eq!(coordinator.apply(LayoutEvent::Highlight), Some(Layout::Secondary));
        assert_eq!(coordinator.apply(LayoutEvent::Highlight), None);
    }

    #[test]
    fn test_panels() {
        assert_eq!(Layout::Main.panels(), &[Panel::Toolbar]);
        assert!(Layout::Secondary.panels().contains(&Panel::ElementProperties));
        assert!(Layout::World.panels().contains(&Panel::WorldSettings));
        assert!(Layout::Classifier.panels().contains(&Panel::Classifier));
    }
}
