// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types surfaced by session operations
//!
//! Element-level misses (an element id absent from its model, a model
//! disposed mid-batch) are never errors; they are skipped.

use frag_viewer_model::{CodecError, ModelId};
use thiserror::Error;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors reported to the caller of a load, export, index or classify
#[derive(Error, Debug)]
pub enum SessionError {
    /// The codec or source loader rejected the buffer
    #[error("Decode failed: {0}")]
    Decode(#[from] CodecError),

    /// Zero-length input buffer
    #[error("Empty input buffer")]
    EmptyInput,

    /// Operation referenced a disposed or never-registered model
    #[error("Unknown model {0}")]
    UnknownModel(ModelId),

    /// Model content could not be written back to a fragment buffer
    #[error("Encode failed: {0}")]
    Encode(#[source] CodecError),

    /// Every model identifier has been handed out
    #[error("Model identifiers exhausted")]
    IdsExhausted,

    /// The off-thread decode task died before reporting a result
    #[error("Decode worker failed: {0}")]
    Worker(String),
}

impl SessionError {
    /// Whether the failure belongs to the decode class (input rejected)
    pub fn is_decode(&self) -> bool {
        matches!(self, SessionError::Decode(_) | SessionError::Worker(_))
    }
}
