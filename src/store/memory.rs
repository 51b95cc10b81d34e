//! In-Memory Backend
//!
//! Process-local tables guarded by a tokio RwLock. Useful for tests and for
//! single-process deployments; contents do not survive a restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::CacheRecord;
use crate::error::{CacheError, Result};
use crate::store::CacheBackend;

type Table = HashMap<String, CacheRecord>;

// == Memory Backend ==
/// HashMap-backed store with switchable failure injection.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, Table>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemoryBackend {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Failure Injection ==
    /// Makes every subsequent `get` fail with `StorageUnavailable`.
    pub fn set_read_failure(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `put` fail with `StorageUnavailable`.
    pub fn set_write_failure(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fails reads, writes and provisioning alike.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.set_read_failure(unavailable);
        self.set_write_failure(unavailable);
    }

    // == Inspection ==
    /// Number of `get` calls that reached the store.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `put` calls that reached the store.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of rows in `table`, expired ones included.
    pub async fn len(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map_or(0, HashMap::len)
    }

    /// Returns true if `table` holds no rows or does not exist.
    pub async fn is_empty(&self, table: &str) -> bool {
        self.len(table).await == 0
    }

    /// Direct row access without touching counters or failure flags.
    pub async fn peek(&self, table: &str, key: &str) -> Option<CacheRecord> {
        self.tables.read().await.get(table)?.get(key).cloned()
    }

    /// Writes a row directly, bypassing counters and failure flags.
    pub async fn insert_raw(&self, table: &str, record: CacheRecord) {
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .insert(record.key.clone(), record);
    }

    fn check(&self, flag: &AtomicBool, op: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(CacheError::StorageUnavailable(format!(
                "memory backend: {} rejected",
                op
            )));
        }
        Ok(())
    }
}

fn missing_table(table: &str) -> CacheError {
    CacheError::StorageUnavailable(format!("table not found: {}", table))
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn ensure_table_exists(&self, table: &str, _key_attribute: &str) -> Result<()> {
        self.check(&self.fail_writes, "create table")?;
        let mut tables = self.tables.write().await;
        if !tables.contains_key(table) {
            tables.insert(table.to_string(), Table::new());
            debug!("Created memory table {}", table);
        }
        Ok(())
    }

    async fn get(&self, table: &str, key: &str) -> Result<Option<CacheRecord>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check(&self.fail_reads, "get")?;
        let tables = self.tables.read().await;
        let rows = tables.get(table).ok_or_else(|| missing_table(table))?;
        Ok(rows.get(key).cloned())
    }

    async fn put(&self, table: &str, record: CacheRecord) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check(&self.fail_writes, "put")?;
        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        rows.insert(record.key.clone(), record);
        Ok(())
    }

    async fn purge_expired(&self, table: &str, now: i64) -> Result<usize> {
        self.check(&self.fail_writes, "purge")?;
        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        let before = rows.len();
        rows.retain(|_, record| !record.is_expired_at(now));
        Ok(before - rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, expires_at: i64) -> CacheRecord {
        CacheRecord {
            key: key.to_string(),
            payload: "payload".to_string(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_ensure_table_is_idempotent() {
        let backend = MemoryBackend::new();
        backend.ensure_table_exists("t", "cache_key").await.unwrap();
        backend.put("t", record("k", 10)).await.unwrap();
        backend.ensure_table_exists("t", "cache_key").await.unwrap();
        assert_eq!(backend.len("t").await, 1);
    }

    #[tokio::test]
    async fn test_get_missing_key_is_none() {
        let backend = MemoryBackend::new();
        backend.ensure_table_exists("t", "cache_key").await.unwrap();
        assert!(backend.get("t", "absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_unknown_table_fails() {
        let backend = MemoryBackend::new();
        let result = backend.get("nope", "k").await;
        assert!(matches!(result, Err(CacheError::StorageUnavailable(_))));
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let backend = MemoryBackend::new();
        backend.ensure_table_exists("t", "cache_key").await.unwrap();
        backend.put("t", record("k", 10)).await.unwrap();
        backend.put("t", record("k", 20)).await.unwrap();

        let stored = backend.get("t", "k").await.unwrap().unwrap();
        assert_eq!(stored.expires_at, 20);
        assert_eq!(backend.len("t").await, 1);
        assert_eq!(backend.write_count(), 2);
        assert_eq!(backend.read_count(), 1);
    }

    #[tokio::test]
    async fn test_get_does_not_filter_expired_rows() {
        let backend = MemoryBackend::new();
        backend.ensure_table_exists("t", "cache_key").await.unwrap();
        backend.put("t", record("old", 1)).await.unwrap();
        assert!(backend.get("t", "old").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let backend = MemoryBackend::new();
        backend.ensure_table_exists("t", "cache_key").await.unwrap();
        backend.put("t", record("old", 100)).await.unwrap();
        backend.put("t", record("fresh", 200)).await.unwrap();

        let removed = backend.purge_expired("t", 100).await.unwrap();
        assert_eq!(removed, 1);
        assert!(backend.peek("t", "old").await.is_none());
        assert!(backend.peek("t", "fresh").await.is_some());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let backend = MemoryBackend::new();
        backend.ensure_table_exists("t", "cache_key").await.unwrap();

        backend.set_read_failure(true);
        assert!(backend.get("t", "k").await.unwrap_err().is_storage());
        assert!(backend.put("t", record("k", 1)).await.is_ok());

        backend.set_unavailable(true);
        assert!(backend.put("t", record("k", 1)).await.is_err());
        assert!(backend.ensure_table_exists("t2", "cache_key").await.is_err());

        backend.set_unavailable(false);
        assert!(backend.get("t", "k").await.unwrap().is_some());
    }
}
