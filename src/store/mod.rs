//! Storage Module
//!
//! The narrow contract the cache-aside controller needs from a key-value store, plus
//! the bundled backends.

mod memory;
mod sled_store;

use async_trait::async_trait;

use crate::cache::CacheRecord;
use crate::error::Result;

pub use memory::MemoryBackend;
pub use sled_store::SledBackend;

/// Name of the key attribute tables are provisioned with.
pub const KEY_ATTRIBUTE: &str = "cache_key";

// Backends are shared process-wide behind an Arc and must synchronize internally.
#[async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    /// Creates the table if needed. Succeeds when it already exists.
    async fn ensure_table_exists(&self, table: &str, key_attribute: &str) -> Result<()>;

    /// Fetches the record stored under `key`. A missing key is `Ok(None)`.
    async fn get(&self, table: &str, key: &str) -> Result<Option<CacheRecord>>;

    /// Stores `record`, replacing any record with the same key.
    async fn put(&self, table: &str, record: CacheRecord) -> Result<()>;

    /// Physically removes records with `expires_at <= now`, returning how many went.
    async fn purge_expired(&self, table: &str, now: i64) -> Result<usize>;

    /// Whether the store deletes expired records on its own.
    fn supports_native_ttl(&self) -> bool {
        false
    }
}
