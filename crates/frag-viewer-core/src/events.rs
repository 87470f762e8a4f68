// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session events and listener registry

use crate::classifier::ClassificationSystem;
use crate::layout::Layout;
use frag_viewer_model::ModelId;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Notification emitted after a state change
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Model is ready to be added to the scene
    ModelLoaded(ModelId),
    /// Model is gone; release its scene resources
    ModelDisposed(ModelId),
    RelationsIndexed(ModelId),
    ClassificationUpdated {
        model: ModelId,
        system: ClassificationSystem,
    },
    SelectionChanged,
    VisibilityChanged,
    LayoutChanged(Layout),
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

#[derive(Default)]
struct Delivery {
    pending: VecDeque<SessionEvent>,
    dispatching: bool,
}

/// Ordered list of listeners
///
/// Events are delivered one at a time, each to every listener, in the order
/// they were emitted. Events emitted while a delivery is running (from a
/// listener calling back into the session, or from another thread) are
/// queued behind it and delivered by the dispatching caller.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
    delivery: Mutex<Delivery>,
    next_id: AtomicU64,
}

/// Releases the dispatcher role when a listener panics
struct DispatchGuard<'a>(&'a Mutex<Delivery>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut delivery = self.0.lock();
            delivery.dispatching = false;
            delivery.pending.clear();
        }
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    /// Queue events and deliver everything queued, oldest first
    ///
    /// No lock is held while a listener runs, so a listener may subscribe,
    /// unsubscribe or call back into the session. Nested emits return
    /// at once; their events follow the one currently being delivered.
    pub fn emit_all(&self, events: &[SessionEvent]) {
        if events.is_empty() {
            return;
        }
        {
            let mut delivery = self.delivery.lock();
            delivery.pending.extend(events.iter().cloned());
            if delivery.dispatching {
                return;
            }
            delivery.dispatching = true;
        }

        let _guard = DispatchGuard(&self.delivery);
        loop {
            let next = {
                let mut delivery = self.delivery.lock();
                let next = delivery.pending.pop_front();
                if next.is_none() {
                    delivery.dispatching = false;
                }
                next
            };
            let Some(event) = next else {
                return;
            };
            let listeners: Vec<Listener> = self
                .listeners
                .read()
                .iter()
                .map(|(_, l)| Arc::clone(l))
                .collect();
            for listener in &listeners {
                listener(&event);
            }
        }
    }

    pub fn emit(&self, event: SessionEvent) {
        self.emit_all(std::slice::from_ref(&event));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
