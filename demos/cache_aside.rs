//! Tiered cache demo
//!
//! Wires a cache at the composition root, warms it, serves reads through
//! cache-aside, and prints the resulting statistics.
//!
//! Run with `cargo run --example cache_aside`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiered_cache::{spawn_cleanup_task, Config, Invalidation, JsonFileStore, TieredCache};

/// Stand-in for a slow upstream lookup.
async fn fetch_profile(key: &str) -> Result<String> {
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(format!("profile for {key}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiered_cache=info,cache_aside=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_memory_size={}, default_ttl={:?}, namespace={}",
        config.max_memory_size, config.default_ttl, config.namespace
    );

    let data_dir = std::env::temp_dir().join("tiered-cache-demo");
    let store = Arc::new(JsonFileStore::open(&data_dir).await?);
    let cache: Arc<TieredCache<String, JsonFileStore>> =
        Arc::new(TieredCache::new(store, config.clone()));

    // Startup sweep, then periodic ones
    let removed = cache.cleanup().await;
    info!("Startup cleanup removed {} expired entries", removed);
    let cleanup_handle = spawn_cleanup_task(cache.clone(), config.cleanup_interval);

    let keys: Vec<String> = (1..=5).map(|i| format!("user:{i}")).collect();
    let report = cache
        .warmup(&keys, |key: &String| {
            let key = key.clone();
            async move { fetch_profile(&key).await }
        })
        .await;
    info!("Warmed {} keys ({} failed)", report.succeeded, report.failed);

    let profile = cache
        .get_or_set("user:6", || fetch_profile("user:6"), None, true)
        .await?;
    info!("Loaded {}", profile);

    cache
        .set_and_store(
            "user:7",
            "profile for user:7".to_string(),
            |value| async move {
                info!("Writing '{}' to the system of record", value);
                Ok::<_, anyhow::Error>(())
            },
            None,
        )
        .await?;

    let invalidated = cache.invalidate(Invalidation::pattern("^user:[12]$")?).await;
    info!("Invalidated {} keys", invalidated);

    let stats = cache.stats().await;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    cleanup_handle.abort();
    Ok(())
}
