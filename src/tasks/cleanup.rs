//! Expiry Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::TieredCache;
use crate::persistent::PersistentTier;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task sleeps for `interval` between sweeps and runs
/// `TieredCache::cleanup` on both tiers each time.
///
/// # Returns
/// A JoinHandle for the spawned task, which the caller aborts at shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(TieredCache::new(store, config.clone()));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), config.cleanup_interval);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<T, P>(cache: Arc<TieredCache<T, P>>, interval: Duration) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
    P: PersistentTier<T> + ?Sized + 'static,
{
    tokio::spawn(async move {
        info!("Starting expiry cleanup task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup().await;

            if removed > 0 {
                info!("Expiry cleanup: removed {} expired entries", removed);
            } else {
                debug!("Expiry cleanup: no expired entries found");
            }
        }
    })
}
