// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frag-Viewer Model - Shared types and the fragment codec boundary
//!
//! This crate provides the data types every part of the viewer agrees on:
//! identifiers for models and elements, the element payload carried by a
//! decoded fragment, relation kinds, property values, and the traits that
//! sit at the edge of the engine.
//!
//! # Architecture
//!
//! - [`FragmentCodec`] - Native fragment binary ⇄ [`ModelData`]
//! - [`SourceLoader`] - Source exchange format → [`ModelData`] (external converter)
//! - [`Model`] - An immutable, registered model with its original fragment buffer
//! - [`RelationKind`] - Closed set of relation kinds understood by the indexer
//!
//! A reference implementation of the native format lives in [`NativeCodec`].
//!
//! # Example
//!
//! ```ignore
//! use frag_viewer_model::{FragmentCodec, NativeCodec, ModelId, Model};
//!
//! let codec = NativeCodec::new();
//! let data = codec.decode(&bytes)?;
//! let model = Model::new(ModelId(1), data, bytes);
//! println!("{} elements", model.element_count());
//! ```

pub mod codec;
pub mod error;
pub mod model;
pub mod properties;
pub mod relations;
pub mod spatial;
pub mod types;

// Re-export all public types
pub use codec::*;
pub use error::*;
pub use model::*;
pub use properties::*;
pub use relations::*;
pub use spatial::*;
pub use types::*;
