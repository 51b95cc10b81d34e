//! DynaCache demo
//!
//! Opens the configured backend, provisions the cache table and runs a memoized
//! computation three times, logging where each result came from.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dynacache::config::BackendKind;
use dynacache::{spawn_reaper_task, CacheBackend, Config, MemoCache, MemoryBackend, SledBackend};

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from the environment (and optional config file)
/// 3. Open the backend and provision the cache table
/// 4. Start the reaper task if an interval is configured
/// 5. Call a memoized computation and report cache statistics
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dynacache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("loading configuration")?;
    info!(
        "Configuration loaded: table={}, default_ttl={}s, backend={:?}, region={:?}",
        config.table_name, config.default_ttl_seconds, config.backend, config.region
    );

    let backend: Arc<dyn CacheBackend> = match config.backend {
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
        BackendKind::Sled => Arc::new(
            SledBackend::open(&config.data_dir).context("opening sled database")?,
        ),
    };

    let cache = MemoCache::connect(backend, &config)
        .await
        .context("provisioning cache table")?;

    let reaper = config
        .reap_interval_seconds
        .map(|interval| spawn_reaper_task(cache.clone(), interval));

    let computations = Arc::new(AtomicUsize::new(0));
    let counter = computations.clone();
    let add = cache.memoize("add", config.default_ttl_seconds, move |(a, b, c): (u64, u64, u64)| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, anyhow::Error>(a + b + c)
        }
    });

    for _ in 0..3 {
        let total = add.call((2, 3, 5)).await?;
        info!(
            "add(2, 3, 5) = {} (computed {} time(s) so far)",
            total,
            computations.load(Ordering::SeqCst)
        );
    }

    let stats = cache.stats();
    info!(
        "Cache stats: hits={}, misses={}, expired={}, writes={}, hit_rate={:.2}",
        stats.hits,
        stats.misses,
        stats.expired,
        stats.writes,
        stats.hit_rate()
    );

    if let Some(handle) = reaper {
        handle.abort();
    }
    Ok(())
}
