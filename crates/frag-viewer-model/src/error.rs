// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for fragment decoding and encoding

use crate::ElementId;
use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised at the codec boundary
#[derive(Error, Debug)]
pub enum CodecError {
    /// Buffer ends before the fixed header does
    #[error("Truncated fragment buffer: {0} bytes")]
    Truncated(usize),

    /// Buffer does not start with the fragment magic
    #[error("Not a fragment buffer (bad magic)")]
    BadMagic,

    /// Fragment written by an unknown format version
    #[error("Unsupported fragment version: {0}")]
    UnsupportedVersion(u16),

    /// Header length disagrees with the payload that follows it
    #[error("Payload length mismatch: header says {declared}, buffer holds {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// Two elements share an identifier within one model
    #[error("Duplicate element {0}")]
    DuplicateElement(ElementId),

    /// Real-valued property that JSON cannot carry (NaN or infinite)
    #[error("Non-finite value for '{property}' on element {element}")]
    NonFinite { element: ElementId, property: String },

    /// Payload could not be (de)serialized
    #[error("Invalid fragment payload: {0}")]
    Payload(String),

    /// The source format loader rejected its input
    #[error("Source conversion failed: {0}")]
    Source(String),

    /// Model could not be written back to a fragment buffer
    #[error("Encode failed: {0}")]
    Encode(String),
}

impl CodecError {
    /// Create a new payload error
    pub fn payload(msg: impl Into<String>) -> Self {
        CodecError::Payload(msg.into())
    }

    /// Create a new source conversion error
    pub fn conversion(msg: impl Into<String>) -> Self {
        CodecError::Source(msg.into())
    }

    /// Create a new encode error
    pub fn encode(msg: impl Into<String>) -> Self {
        CodecError::Encode(msg.into())
    }
}
