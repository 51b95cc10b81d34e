//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for key derivation, encoding and storage access.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Arguments could not be turned into a valid key
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// The backing store could not be reached or rejected the request
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A cached payload could not be decoded back into a value
    #[error("Decode failed: {0}")]
    Decode(String),

    /// A computed value could not be encoded into a payload
    #[error("Encode failed: {0}")]
    Encode(String),

    /// Table setup failed at initialization
    #[error("Provisioning failed: {0}")]
    Provisioning(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Returns true for errors raised by the backing store.
    pub fn is_storage(&self) -> bool {
        matches!(self, CacheError::StorageUnavailable(_))
    }
}

impl From<sled::Error> for CacheError {
    fn from(err: sled::Error) -> Self {
        CacheError::StorageUnavailable(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::KeyDerivation("bad args".to_string());
        assert_eq!(err.to_string(), "Key derivation failed: bad args");
    }

    #[test]
    fn test_is_storage() {
        assert!(CacheError::StorageUnavailable("timeout".into()).is_storage());
        assert!(!CacheError::Decode("corrupt".into()).is_storage());
    }

    #[test]
    fn test_into_anyhow() {
        let err: anyhow::Error = CacheError::Provisioning("no table".into()).into();
        assert!(err.downcast_ref::<CacheError>().is_some());
    }
}
