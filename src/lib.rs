//! DynaCache - cache-aside memoization backed by a durable key-value store
//!
//! Wraps arbitrary computations so their results are stored under a key derived from
//! the computation's identity and arguments, and served back until their TTL elapses.
//!
//! ```ignore
//! let backend = Arc::new(SledBackend::open("./data/cache")?);
//! let cache = MemoCache::connect(backend, &Config::new("results")).await?;
//!
//! let total: u64 = cache
//!     .get_or_compute("add", &(2, 3, 5), 40, || async { Ok::<_, anyhow::Error>(2 + 3 + 5) })
//!     .await?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod store;
pub mod tasks;

pub use cache::{CacheStats, Encoding, FailurePolicy, MemoCache, Memoized};
pub use config::Config;
pub use error::{CacheError, Result};
pub use store::{CacheBackend, MemoryBackend, SledBackend};
pub use tasks::spawn_reaper_task;
