//! Prefetch Module
//!
//! Concurrent cache-aside population for batches of keys.

use std::future::Future;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::info;

use crate::cache::TieredCache;
use crate::error::CacheError;
use crate::persistent::PersistentTier;

// == Prefetch Item ==
/// Anything that names the cache key it should be stored under.
///
/// Strings are their own key; records expose their key field.
pub trait PrefetchItem {
    fn cache_key(&self) -> &str;
}

impl PrefetchItem for String {
    fn cache_key(&self) -> &str {
        self
    }
}

impl PrefetchItem for &str {
    fn cache_key(&self) -> &str {
        self
    }
}

// == Outcomes ==
/// Result of prefetching one item.
#[derive(Debug)]
pub struct PrefetchOutcome<T, E> {
    pub key: String,
    pub result: Result<T, E>,
}

impl<T, E> PrefetchOutcome<T, E> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Result of a warmup run.
#[derive(Debug)]
pub struct WarmupReport<T, E> {
    /// Per-key outcomes in input order
    pub outcomes: Vec<PrefetchOutcome<T, E>>,
    /// Keys that ended up cached
    pub succeeded: usize,
    /// Keys whose fetch failed
    pub failed: usize,
}

impl<T, P> TieredCache<T, P>
where
    T: Clone + Send + Sync + 'static,
    P: PersistentTier<T> + ?Sized,
{
    // == Prefetch ==
    /// Runs `get_or_set` for every item concurrently.
    ///
    /// All items settle: a failing fetch is reported in its own outcome and
    /// does not stop the others. Outcomes follow the order of `items`.
    pub async fn prefetch<I, F, Fut, E>(
        &self,
        items: &[I],
        fetch: F,
        ttl: Option<Duration>,
    ) -> Vec<PrefetchOutcome<T, E>>
    where
        I: PrefetchItem,
        F: Fn(&I) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CacheError>,
    {
        let fetch = &fetch;
        let tasks = items.iter().map(|item| async move {
            let key = item.cache_key();
            let result = self.get_or_set(key, || fetch(item), ttl, false).await;
            PrefetchOutcome {
                key: key.to_string(),
                result,
            }
        });

        join_all(tasks).await
    }

    // == Warmup ==
    /// Prefetches `keys` with the default TTL and tallies the outcomes.
    pub async fn warmup<K, F, Fut, E>(&self, keys: &[K], fetch: F) -> WarmupReport<T, E>
    where
        K: PrefetchItem,
        F: Fn(&K) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CacheError>,
    {
        let outcomes = self.prefetch(keys, fetch, None).await;
        let succeeded = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
        let failed = outcomes.len() - succeeded;

        info!("Cache warmup: {}/{} keys loaded", succeeded, outcomes.len());

        WarmupReport {
            outcomes,
            succeeded,
            failed,
        }
    }
}
