//! Codec Module
//!
//! Reversible transformation between computed values and text-safe payloads.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Encoding ==
/// Serialization scheme shared by key derivation and payload encoding.
///
/// `Structural` accepts any serde value; `Textual` only what JSON can express, e.g. maps
/// keyed by non-string values are rejected. Entries written under one scheme are not
/// readable under the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// bincode bytes, URL-safe base64 text
    #[default]
    Structural,
    /// JSON text
    Textual,
}

impl Encoding {
    // == Encode ==
    /// Encodes a value into a payload string.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        match self {
            Encoding::Structural => {
                let bytes = to_structural_bytes(value)
                    .map_err(|e| CacheError::Encode(e.to_string()))?;
                Ok(URL_SAFE_NO_PAD.encode(bytes))
            }
            Encoding::Textual => {
                serde_json::to_string(value).map_err(|e| CacheError::Encode(e.to_string()))
            }
        }
    }

    // == Decode ==
    /// Decodes a payload string produced by [`Encoding::encode`].
    pub fn decode<T: DeserializeOwned>(&self, payload: &str) -> Result<T> {
        match self {
            Encoding::Structural => {
                let bytes = URL_SAFE_NO_PAD
                    .decode(payload)
                    .map_err(|e| CacheError::Decode(format!("invalid base64: {}", e)))?;
                bincode::deserialize(&bytes).map_err(|e| CacheError::Decode(e.to_string()))
            }
            Encoding::Textual => {
                serde_json::from_str(payload).map_err(|e| CacheError::Decode(e.to_string()))
            }
        }
    }
}

impl std::str::FromStr for Encoding {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structural" | "binary" => Ok(Encoding::Structural),
            "textual" | "json" => Ok(Encoding::Textual),
            other => Err(CacheError::Config(format!("unknown encoding '{}'", other))),
        }
    }
}

/// Canonical binary form of a value.
pub(crate) fn to_structural_bytes<T: Serialize + ?Sized>(
    value: &T,
) -> std::result::Result<Vec<u8>, bincode::Error> {
    bincode::serialize(value)
}
