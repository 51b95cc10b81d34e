//! Key Derivation Module
//!
//! Turns a computation's identity and its arguments into a store key.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Serialize;

use crate::cache::codec::{to_structural_bytes, Encoding};
use crate::error::{CacheError, Result};

/// Maximum derived key length in bytes.
pub const MAX_KEY_LENGTH: usize = 2048;

// == Key Deriver ==
/// Derives deterministic keys under a fixed [`Encoding`].
///
/// Positional arguments are passed as a tuple, named arguments as a struct. Arguments must
/// serialize identically for identical values; `HashMap` iteration order is not stable, so
/// map-shaped arguments should use `BTreeMap`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyDeriver {
    encoding: Encoding,
}

impl KeyDeriver {
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    // == Derive ==
    /// Derives the key for one invocation.
    ///
    /// Structural keys are the base64 text of the binary `(identity, args)` pair.
    /// Textual keys are `"{identity}:{json}"`.
    ///
    /// # Errors
    /// `KeyDerivation` when the identity is empty, the arguments cannot be serialized
    /// under the chosen encoding, or the key exceeds [`MAX_KEY_LENGTH`].
    pub fn derive<A: Serialize + ?Sized>(&self, identity: &str, args: &A) -> Result<String> {
        if identity.is_empty() {
            return Err(CacheError::KeyDerivation(
                "identity must not be empty".to_string(),
            ));
        }

        let key = match self.encoding {
            Encoding::Structural => {
                let bytes = to_structural_bytes(&(identity, args)).map_err(|e| {
                    CacheError::KeyDerivation(format!("{}: {}", identity, e))
                })?;
                URL_SAFE_NO_PAD.encode(bytes)
            }
            Encoding::Textual => {
                let value = serde_json::to_value(args).map_err(|e| {
                    CacheError::KeyDerivation(format!("{}: {}", identity, e))
                })?;
                format!("{}:{}", identity, value)
            }
        };

        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::KeyDerivation(format!(
                "{}: key of {} bytes exceeds maximum length of {} bytes",
                identity,
                key.len(),
                MAX_KEY_LENGTH
            )));
        }

        Ok(key)
    }
}
