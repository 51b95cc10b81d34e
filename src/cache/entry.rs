//! Cache Record Module
//!
//! Defines the persisted unit: a derived key, an encoded payload and an absolute expiry.

use serde::{Deserialize, Serialize};

// == Cache Record ==
/// A single persisted cache entry.
///
/// Records are written whole and never updated in place. A record past its expiry is
/// logically absent even if the store still holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Derived cache key
    pub key: String,
    /// Text-safe encoded result
    pub payload: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: i64,
}

impl CacheRecord {
    // == Constructor ==
    /// Creates a record that expires `ttl_seconds` after `now`.
    ///
    /// # Arguments
    /// * `key` - The derived cache key
    /// * `payload` - The encoded value
    /// * `now` - Current Unix timestamp in seconds
    /// * `ttl_seconds` - Lifetime of the record
    pub fn new(key: String, payload: String, now: i64, ttl_seconds: u64) -> Self {
        let ttl = i64::try_from(ttl_seconds).unwrap_or(i64::MAX);
        Self {
            key,
            payload,
            expires_at: now.saturating_add(ttl),
        }
    }

    // == Is Expired ==
    /// Checks whether the record is stale at `now`.
    ///
    /// Boundary condition: a record whose expiry equals the current time is expired,
    /// so only `expires_at > now` counts as a hit.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now
    }

    /// Returns remaining lifetime in seconds at `now`, or 0 once expired.
    pub fn ttl_remaining(&self, now: i64) -> u64 {
        u64::try_from(self.expires_at.saturating_sub(now)).unwrap_or(0)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creation() {
        let record = CacheRecord::new("k".to_string(), "p".to_string(), 1_000, 40);

        assert_eq!(record.key, "k");
        assert_eq!(record.payload, "p");
        assert_eq!(record.expires_at, 1_040);
    }

    #[test]
    fn test_record_not_expired_before_deadline() {
        let record = CacheRecord::new("k".to_string(), "p".to_string(), 1_000, 40);
        assert!(!record.is_expired_at(1_039));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let record = CacheRecord::new("k".to_string(), "p".to_string(), 1_000, 40);
        assert!(record.is_expired_at(1_040), "Record should be expired at boundary");
        assert!(record.is_expired_at(1_041));
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let record = CacheRecord::new("k".to_string(), "p".to_string(), 1_000, 0);
        assert!(record.is_expired_at(1_000));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let record = CacheRecord::new("k".to_string(), "p".to_string(), 1_000, u64::MAX);
        assert_eq!(record.expires_at, i64::MAX);
        assert!(!record.is_expired_at(1_000));
    }

    #[test]
    fn test_ttl_remaining() {
        let record = CacheRecord::new("k".to_string(), "p".to_string(), 1_000, 10);
        assert_eq!(record.ttl_remaining(1_004), 6);
        assert_eq!(record.ttl_remaining(1_020), 0);
    }
}
