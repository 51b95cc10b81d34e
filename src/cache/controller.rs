//! Cache-Aside Controller
//!
//! Read-before-compute and write-after-compute around an arbitrary async computation.

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{
    CacheRecord, CacheStats, Clock, Encoding, KeyDeriver, Memoized, StatsRecorder, SystemClock,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::store::{CacheBackend, KEY_ATTRIBUTE};

// == Failure Policy ==
/// What a call does when the store cannot be read or written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the storage error and return the computed value uncached
    #[default]
    FailOpen,
    /// Return the storage error to the caller
    FailClosed,
}

impl std::str::FromStr for FailurePolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_open" | "open" => Ok(FailurePolicy::FailOpen),
            "fail_closed" | "closed" => Ok(FailurePolicy::FailClosed),
            other => Err(CacheError::Config(format!(
                "unknown failure policy '{}'",
                other
            ))),
        }
    }
}

struct Inner {
    backend: Arc<dyn CacheBackend>,
    table: String,
    default_ttl: u64,
    keys: KeyDeriver,
    codec: Encoding,
    policy: FailurePolicy,
    clock: Arc<dyn Clock>,
    stats: StatsRecorder,
}

// == Memo Cache ==
/// Cache-aside controller bound to one table of one backend.
///
/// Built once at startup and cloned freely; clones share the backend and counters.
/// Concurrent misses on the same key are not coalesced: each computes and the last
/// write wins.
#[derive(Clone)]
pub struct MemoCache {
    inner: Arc<Inner>,
}

impl MemoCache {
    // == Constructor ==
    /// Validates `config` and provisions its table on `backend`.
    ///
    /// # Errors
    /// `Config` for an invalid configuration, `Provisioning` when the table cannot be
    /// created.
    pub async fn connect(backend: Arc<dyn CacheBackend>, config: &Config) -> Result<Self> {
        Self::connect_with_clock(backend, config, Arc::new(SystemClock)).await
    }

    /// Same as [`MemoCache::connect`] with an explicit time source.
    pub async fn connect_with_clock(
        backend: Arc<dyn CacheBackend>,
        config: &Config,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        backend
            .ensure_table_exists(&config.table_name, KEY_ATTRIBUTE)
            .await
            .map_err(|e| {
                CacheError::Provisioning(format!(
                    "failed to create cache table {}: {}",
                    config.table_name, e
                ))
            })?;

        info!(
            "Cache table {} ready: default_ttl={}s, keys={:?}, payloads={:?}, policy={:?}, native_ttl={}",
            config.table_name,
            config.default_ttl_seconds,
            config.key_encoding,
            config.payload_encoding,
            config.failure_policy,
            backend.supports_native_ttl()
        );

        Ok(Self {
            inner: Arc::new(Inner {
                backend,
                table: config.table_name.clone(),
                default_ttl: config.default_ttl_seconds,
                keys: KeyDeriver::new(config.key_encoding),
                codec: config.payload_encoding,
                policy: config.failure_policy,
                clock,
                stats: StatsRecorder::default(),
            }),
        })
    }

    // == Accessors ==
    pub fn table_name(&self) -> &str {
        &self.inner.table
    }

    pub fn default_ttl(&self) -> u64 {
        self.inner.default_ttl
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.inner.policy
    }

    /// Returns a snapshot of the hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot()
    }

    /// Derives the key a call with `identity` and `args` reads and writes.
    pub fn derive_key<A: Serialize + ?Sized>(&self, identity: &str, args: &A) -> Result<String> {
        self.inner.keys.derive(identity, args)
    }

    // == Get Or Compute ==
    /// Returns the cached result for `(identity, args)`, or runs `compute` and caches it.
    ///
    /// A record is a hit only while `expires_at > now`. On a miss, an expired record or
    /// an undecodable payload, `compute` runs once and its result is written with
    /// `expires_at = now + ttl_seconds`, replacing any previous record.
    ///
    /// # Errors
    /// Errors from `compute` are returned unchanged. Key derivation failures, and
    /// storage failures under [`FailurePolicy::FailClosed`], are returned as
    /// `E::from(CacheError)`.
    pub async fn get_or_compute<A, T, E, F, Fut>(
        &self,
        identity: &str,
        args: &A,
        ttl_seconds: u64,
        compute: F,
    ) -> std::result::Result<T, E>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let key = self.derive_key(identity, args)?;
        self.resolve(&key, ttl_seconds, compute).await
    }

    /// [`MemoCache::get_or_compute`] with the configured default TTL.
    pub async fn get_or_compute_default<A, T, E, F, Fut>(
        &self,
        identity: &str,
        args: &A,
        compute: F,
    ) -> std::result::Result<T, E>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        self.get_or_compute(identity, args, self.inner.default_ttl, compute)
            .await
    }

    /// Wraps `func` so every call goes through this cache under `identity`.
    pub fn memoize<F>(
        &self,
        identity: impl Into<String>,
        ttl_seconds: u64,
        func: F,
    ) -> Memoized<F> {
        Memoized::new(self.clone(), identity.into(), ttl_seconds, func)
    }

    /// Physically deletes expired records from the table.
    pub async fn purge_expired(&self) -> Result<usize> {
        let now = self.inner.clock.now();
        self.inner.backend.purge_expired(&self.inner.table, now).await
    }

    pub(crate) async fn resolve<T, E, F, Fut>(
        &self,
        key: &str,
        ttl_seconds: u64,
        compute: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let read_failed = match self.lookup(key).await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => false,
            Err(err) => {
                self.absorb_storage_error("get", key, err)?;
                true
            }
        };

        let value = compute().await?;
        // A failed read leaves the result uncached.
        if !read_failed {
            self.store(key, &value, ttl_seconds).await?;
        }
        Ok(value)
    }

    // == Lookup ==
    /// Reads and decodes an unexpired record. Expired and corrupt records read as None.
    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let inner = &self.inner;
        let record = match inner.backend.get(&inner.table, key).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                inner.stats.record_miss();
                debug!("Cache miss for {}", key);
                return Ok(None);
            }
            Err(CacheError::Decode(msg)) => {
                inner.stats.record_decode_failure();
                warn!("Unreadable record for {}, recomputing: {}", key, msg);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let now = inner.clock.now();
        if record.is_expired_at(now) {
            inner.stats.record_expired();
            debug!(
                "Cache entry for {} expired {}s ago",
                key,
                now - record.expires_at
            );
            return Ok(None);
        }

        match inner.codec.decode(&record.payload) {
            Ok(value) => {
                inner.stats.record_hit();
                debug!(
                    "Cache hit for {} ({}s remaining)",
                    key,
                    record.ttl_remaining(now)
                );
                Ok(Some(value))
            }
            Err(err) => {
                inner.stats.record_decode_failure();
                warn!("Failed to decode cached payload for {}, recomputing: {}", key, err);
                Ok(None)
            }
        }
    }

    // == Store ==
    /// Encodes `value` and writes it with a fresh expiry.
    async fn store<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: u64) -> Result<()> {
        let inner = &self.inner;
        let payload = match inner.codec.encode(value) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("Result for {} not cached: {}", key, err);
                return Ok(());
            }
        };

        let record = CacheRecord::new(key.to_string(), payload, inner.clock.now(), ttl_seconds);
        let expires_at = record.expires_at;
        match inner.backend.put(&inner.table, record).await {
            Ok(()) => {
                inner.stats.record_write();
                debug!("Cached result for {} until {}", key, expires_at);
                Ok(())
            }
            Err(err) => self.absorb_storage_error("put", key, err),
        }
    }

    /// Applies the failure policy to a storage error.
    fn absorb_storage_error(&self, op: &str, key: &str, err: CacheError) -> Result<()> {
        self.inner.stats.record_storage_failure();
        match self.inner.policy {
            FailurePolicy::FailOpen => {
                warn!("Store {} failed for {}, continuing uncached: {}", op, key, err);
                Ok(())
            }
            FailurePolicy::FailClosed => {
                warn!("Store {} failed for {}: {}", op, key, err);
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for MemoCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoCache")
            .field("table", &self.inner.table)
            .field("default_ttl", &self.inner.default_ttl)
            .field("keys", &self.inner.keys.encoding())
            .field("codec", &self.inner.codec)
            .field("policy", &self.inner.policy)
            .finish()
    }
}
