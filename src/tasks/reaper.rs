//! Expired-Row Reaper
//!
//! Background task that periodically deletes expired records from the cache table,
//! for stores without native TTL expiry. Lookups never depend on it having run.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::MemoCache;

/// Spawns a background task that periodically purges expired records.
///
/// The task runs until aborted, sleeping for the interval between runs. Store errors
/// are logged and the next run proceeds as usual.
///
/// # Arguments
/// * `cache` - The cache whose table is purged
/// * `interval_secs` - Interval in seconds between runs
///
/// # Returns
/// A JoinHandle for the spawned task, used to abort it on shutdown.
///
/// # Example
/// ```ignore
/// let reaper = spawn_reaper_task(cache.clone(), 60);
/// // Later, during shutdown:
/// reaper.abort();
/// ```
pub fn spawn_reaper_task(cache: MemoCache, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting reaper for table {} with interval of {} seconds",
            cache.table_name(),
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            match cache.purge_expired().await {
                Ok(0) => debug!("Reaper: no expired records found"),
                Ok(removed) => info!("Reaper: removed {} expired records", removed),
                Err(err) => warn!("Reaper: purge failed: {}", err),
            }
        }
    })
}
