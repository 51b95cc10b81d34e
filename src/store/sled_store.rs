//! Sled Backend
//!
//! Durable on-disk store. Each table is a sled tree and each record is stored as JSON
//! under its cache key.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::CacheRecord;
use crate::error::{CacheError, Result};
use crate::store::CacheBackend;

// == Sled Backend ==
/// sled-based persistence for cache records.
///
/// Only tables provisioned through `ensure_table_exists` on this instance are readable;
/// their trees are kept open for the lifetime of the backend.
pub struct SledBackend {
    db: sled::Db,
    tables: RwLock<HashMap<String, sled::Tree>>,
}

impl SledBackend {
    /// Opens (or creates) a database at `path`.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::StorageUnavailable(format!("Failed to create directory: {}", e))
            })?;
        }

        let db = sled::open(path.as_ref())?;
        info!("Opened sled database at {}", path.as_ref().display());
        Ok(Self::from_db(db))
    }

    /// Opens a throwaway database that is removed when dropped.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self::from_db(db))
    }

    fn from_db(db: sled::Db) -> Self {
        Self {
            db,
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Writes raw bytes under `key`, bypassing record serialization.
    pub async fn insert_raw(&self, table: &str, key: &str, value: &[u8]) -> Result<()> {
        let tree = self.tree(table).await?;
        tree.insert(key.as_bytes(), value)?;
        Ok(())
    }

    /// Number of provisioned tables held open.
    pub async fn open_tables(&self) -> usize {
        self.tables.read().await.len()
    }

    async fn tree(&self, table: &str) -> Result<sled::Tree> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .ok_or_else(|| CacheError::StorageUnavailable(format!("table not found: {}", table)))
    }
}

#[async_trait]
impl CacheBackend for SledBackend {
    async fn ensure_table_exists(&self, table: &str, key_attribute: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.contains_key(table) {
            let tree = self.db.open_tree(table)?;
            tables.insert(table.to_string(), tree);
        }
        debug!("Table {} ready (key attribute {})", table, key_attribute);
        Ok(())
    }

    async fn get(&self, table: &str, key: &str) -> Result<Option<CacheRecord>> {
        let tree = self.tree(table).await?;
        match tree.get(key.as_bytes())? {
            Some(bytes) => {
                let record = serde_json::from_slice(&bytes).map_err(|e| {
                    CacheError::Decode(format!("Failed to deserialize record: {}", e))
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, table: &str, record: CacheRecord) -> Result<()> {
        let tree = self.tree(table).await?;
        // Reported as a store fault: the record itself is only strings and integers.
        let value = serde_json::to_vec(&record).map_err(|e| {
            CacheError::StorageUnavailable(format!("Failed to serialize record: {}", e))
        })?;
        tree.insert(record.key.as_bytes(), value)?;
        tree.flush_async().await?;
        Ok(())
    }

    async fn purge_expired(&self, table: &str, now: i64) -> Result<usize> {
        let tree = self.tree(table).await?;
        let mut expired = Vec::new();

        for row in tree.iter() {
            let (key, value) = row?;
            // Rows that no longer parse are left for the controller to overwrite.
            if let Ok(record) = serde_json::from_slice::<CacheRecord>(&value) {
                if record.is_expired_at(now) {
                    expired.push(key);
                }
            }
        }

        for key in &expired {
            tree.remove(key)?;
        }
        if !expired.is_empty() {
            tree.flush_async().await?;
        }
        Ok(expired.len())
    }
}
