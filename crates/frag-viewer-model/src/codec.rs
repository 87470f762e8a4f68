// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Codec boundary: native fragment binary and source format conversion
//!
//! The engine only ever sees these traits. [`NativeCodec`] is the reference
//! implementation of the native fragment format:
//!
//! ```text
//! "FRAG" | version: u16 LE | flags: u16 LE | payload length: u32 LE | JSON payload
//! ```
//!
//! Flag bit 0 marks a model that carries property data.

use crate::{CodecError, ModelData, Result};
use serde::{Deserialize, Serialize};

/// Fragment buffer magic number
pub const FRAGMENT_MAGIC: [u8; 4] = *b"FRAG";

/// Current native format version
pub const FRAGMENT_VERSION: u16 = 1;

/// File extension used for exported fragments
pub const FRAGMENT_EXTENSION: &str = "frag";

const HEADER_LEN: usize = 12;
const FLAG_HAS_PROPERTIES: u16 = 0b0000_0001;

/// Format tag accompanying a load request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FragmentFormat {
    /// Native fragment binary
    Native,
    /// Source exchange format, converted by a [`SourceLoader`] first
    Source,
}

impl FragmentFormat {
    /// Guess the format from a file name
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            FRAGMENT_EXTENSION => Some(FragmentFormat::Native),
            "ifc" => Some(FragmentFormat::Source),
            _ => None,
        }
    }
}

/// Settings handed to the source format loader
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderSettings {
    /// Move the model so its coordinates start at the origin
    pub coordinate_to_origin: bool,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            coordinate_to_origin: true,
        }
    }
}

/// Native fragment binary ⇄ model content
///
/// Implementations may be expensive; the session calls them off the event loop.
pub trait FragmentCodec: Send + Sync {
    /// Decode a native fragment buffer
    fn decode(&self, bytes: &[u8]) -> Result<ModelData>;

    /// Encode model content to a native fragment buffer
    fn encode(&self, data: &ModelData) -> Result<Vec<u8>>;
}

/// Source exchange format → model content
///
/// Stands in for the external geometry-exchange loader.
pub trait SourceLoader: Send + Sync {
    /// Convert a source buffer into model content
    fn load(&self, bytes: &[u8], settings: &LoaderSettings) -> Result<ModelData>;
}

/// Reference native fragment codec
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeCodec;

impl NativeCodec {
    pub fn new() -> Self {
        Self
    }
}

impl FragmentCodec for NativeCodec {
    fn decode(&self, bytes: &[u8]) -> Result<ModelData> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::Truncated(bytes.len()));
        }
        if bytes[0..4] != FRAGMENT_MAGIC {
            return Err(CodecError::BadMagic);
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != FRAGMENT_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }
        let flags = u16::from_le_bytes([bytes[6], bytes[7]]);
        let declared = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;

        let payload = &bytes[HEADER_LEN..];
        if payload.len() != declared {
            return Err(CodecError::LengthMismatch {
                declared,
                actual: payload.len(),
            });
        }

        let mut data: ModelData =
            serde_json::from_slice(payload).map_err(|e| CodecError::payload(e.to_string()))?;
        data.has_properties = flags & FLAG_HAS_PROPERTIES != 0;
        data.validate()?;

        log::debug!(
            "Decoded fragment '{}': {} elements, properties: {}",
            data.name,
            data.elements.len(),
            data.has_properties
        );
        Ok(data)
    }

    fn encode(&self, data: &ModelData) -> Result<Vec<u8>> {
        data.validate()
            .map_err(|e| CodecError::encode(e.to_string()))?;
        let payload = serde_json::to_vec(data).map_err(|e| CodecError::encode(e.to_string()))?;
        let len = u32::try_from(payload.len())
            .map_err(|_| CodecError::encode("payload exceeds 4 GiB"))?;
        let flags = if data.has_properties {
            FLAG_HAS_PROPERTIES
        } else {
            0
        };

        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&FRAGMENT_MAGIC);
        out.extend_from_slice(&FRAGMENT_VERSION.to_le_bytes());
        out.extend_from_slice(&flags.to_le_bytes());
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Element, ElementId, RelationKind};

    fn sample() -> ModelData {
        ModelData::new("duplex", true)
            .with_element(Element::new(1, "IFCBUILDINGSTOREY").with_name("Level 1"))
            .with_element(
                Element::new(2, "IFCWALL")
                    .with_global_id("2O2Fr$t4X7Zf8NOew3FLOH")
                    .with_property("Height", 2.7)
                    .with_relation(RelationKind::IsContainedIn, [ElementId(1)]),
            )
    }

    #[test]
    fn test_reencode_is_lossless() {
        let codec = NativeCodec::new();
        let bytes = codec.encode(&sample()).unwrap();
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, sample());
        assert_eq!(codec.encode(&decoded).unwrap(), bytes);
    }

    #[test]
    fn test_property_flag_survives() {
        let codec = NativeCodec::new();
        let mut data = sample();
        data.has_properties = false;
        let decoded = codec.decode(&codec.encode(&data).unwrap()).unwrap();
        assert!(!decoded.has_properties);
    }

    #[test]
    fn test_rejects_malformed() {
        let codec = NativeCodec::new();
        assert!(matches!(codec.decode(b"FRAG"), Err(CodecError::Truncated(4))));
        assert!(matches!(
            codec.decode(b"NOPE\x01\x00\x00\x00\x00\x00\x00\x00"),
            Err(CodecError::BadMagic)
        ));

        let mut bytes = codec.encode(&sample()).unwrap();
        bytes[4] = 9;
        assert!(matches!(
            codec.decode(&bytes),
            Err(CodecError::UnsupportedVersion(9))
        ));

        let mut bytes = codec.encode(&sample()).unwrap();
        bytes.pop();
        assert!(matches!(
            codec.decode(&bytes),
            Err(CodecError::LengthMismatch { .. })
        ));

        let mut bytes = codec.encode(&sample()).unwrap();
        bytes[HEADER_LEN] = b'!';
        assert!(matches!(codec.decode(&bytes), Err(CodecError::Payload(_))));
    }

    #[test]
    fn test_encode_refuses_non_finite() {
        let data = sample().with_element(Element::new(3, "IFCSLAB").with_property("Area", f64::NAN));
        assert!(matches!(
            NativeCodec::new().encode(&data),
            Err(CodecError::Encode(_))
        ));
    }

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(
            FragmentFormat::from_file_name("model_fragments.frag"),
            Some(FragmentFormat::Native)
        );
        assert_eq!(
            FragmentFormat::from_file_name("Duplex.IFC"),
            Some(FragmentFormat::Source)
        );
        assert_eq!(FragmentFormat::from_file_name("notes.txt"), None);
        assert_eq!(FragmentFormat::from_file_name("noext"), None);
    }
}
