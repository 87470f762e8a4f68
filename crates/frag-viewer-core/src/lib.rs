// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frag-Viewer Core - Model session and selection/visibility engine
//!
//! This crate holds the state behind a BIM fragment viewer: which models are
//! loaded, how their elements relate, how they are classified, and what the
//! user has selected, hidden and opened. Rendering and widgets live outside;
//! they talk to a [`Session`] and listen for [`SessionEvent`]s.
//!
//! # Features
//!
//! - **Off-thread decoding** - fragment buffers are decoded on the blocking pool
//! - **Relation graph** - property-set, containment and decomposition links in both directions
//! - **Classification** - trees by entity type and by spatial structure
//! - **Skip-missing batches** - selection and visibility never fail on stale ids
//! - **Replayable layout** - the panel layout is a pure fold over layout events
//!
//! # Example
//!
//! ```ignore
//! use frag_viewer_core::{SelectMode, Session};
//! use frag_viewer_model::{ElementId, FragmentFormat};
//!
//! let session = Session::new();
//! let model = session.load(bytes, FragmentFormat::Native).await?;
//!
//! session.select(model, [ElementId(42)], SelectMode::Replace);
//! session.isolate_selection();
//! println!("{} visible", session.visible_count());
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod events;
pub mod indexer;
pub mod layout;
pub mod properties;
pub mod registry;
pub mod selection;
pub mod session;
pub mod visibility;

pub use classifier::{
    ClassificationEntry, ClassificationGroup, ClassificationSystem, ClassificationTree,
    Classifier, UNCLASSIFIED_GROUP,
};
pub use config::{SessionConfig, DEFAULT_EXPORT_FILE_NAME};
pub use error::{Result, SessionError};
pub use events::{EventBus, SessionEvent, SubscriptionId};
pub use indexer::{RelationGraph, RelationIndexer};
pub use layout::{replay, transition, Layout, LayoutCoordinator, LayoutEvent, Panel};
pub use registry::{ModelRegistry, Removal};
pub use selection::{SelectMode, SelectionSet};
pub use session::{Session, SessionBuilder};
pub use visibility::VisibilityState;

/// Re-exported model crate
pub use frag_viewer_model as model;
