//! Tiered Cache Module
//!
//! The cache facade: a bounded memory tier in front of an injected persistent
//! tier, with cache-aside, write-through, and invalidation built on top.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::expiry::{sweep_memory, sweep_persistent};
use crate::cache::invalidate::{matching_keys, Invalidation};
use crate::cache::{CacheEntry, CacheStats, EvictionPolicy, MemoryTier, StatsReport, MAX_KEY_LENGTH};
use crate::config::Config;
use crate::error::{CacheError, Result, StoreError};
use crate::persistent::PersistentTier;

/// Memory tier and counters, always locked together.
#[derive(Debug)]
struct Inner<T> {
    memory: MemoryTier<T>,
    stats: CacheStats,
}

// == Tiered Cache ==
/// Two-tier cache facade.
///
/// Construct one per process at the composition root and share it as
/// `Arc<TieredCache<..>>`. The memory tier lock is never held while awaiting
/// the persistent tier or a caller-supplied future, so concurrent misses on
/// one key may both promote it; the last write wins.
///
/// Persistent tier failures are logged and never fail a call. They only
/// cost performance.
pub struct TieredCache<T, P: ?Sized> {
    /// Memory tier and statistics
    inner: RwLock<Inner<T>>,
    /// Durable tier, owned elsewhere
    store: Arc<P>,
    /// Cache configuration
    config: Config,
}

impl<T, P> TieredCache<T, P>
where
    T: Clone + Send + Sync + 'static,
    P: PersistentTier<T> + ?Sized,
{
    // == Constructor ==
    /// Creates a cache over `store` using the given configuration.
    pub fn new(store: Arc<P>, config: Config) -> Self {
        let memory = MemoryTier::new(
            config.max_memory_size,
            EvictionPolicy::new(config.eviction_batch_fraction),
        );

        Self {
            inner: RwLock::new(Inner {
                memory,
                stats: CacheStats::new(),
            }),
            store,
            config,
        }
    }

    /// Creates a cache over `store` with the default configuration.
    pub fn with_defaults(store: Arc<P>) -> Self {
        Self::new(store, Config::default())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Persistent tier namespace this cache reads and writes.
    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn store(&self) -> &Arc<P> {
        &self.store
    }

    // == Set ==
    /// Stores a value, evicting from the memory tier if it overflows.
    ///
    /// With `persistent`, the entry is also upserted into the persistent tier.
    /// Only the memory tier write decides success.
    ///
    /// # Arguments
    /// * `key` - Non-empty key of at most `MAX_KEY_LENGTH` bytes
    /// * `value` - The value to store
    /// * `ttl` - Time to live (uses the configured default if None)
    /// * `persistent` - Whether to write the persistent tier as well
    pub async fn set(
        &self,
        key: impl Into<String>,
        value: T,
        ttl: Option<Duration>,
        persistent: bool,
    ) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;
        let ttl = self.effective_ttl(ttl)?;

        let entry = CacheEntry::new(key, value, ttl);
        let durable = persistent.then(|| entry.clone());

        {
            let mut guard = self.inner.write().await;
            let inner = &mut *guard;
            let evicted = inner.memory.insert(entry);
            inner.stats.record_evictions(evicted.len());
            inner.stats.record_set();
        }

        if let Some(entry) = durable {
            self.upsert(&entry).await;
        }

        Ok(())
    }

    // == Get ==
    /// Retrieves a live value from either tier.
    pub async fn get(&self, key: &str) -> Option<T> {
        self.get_with(key, true).await
    }

    /// Retrieves a live value, optionally falling back to the persistent tier.
    ///
    /// A memory tier hit bumps the entry's hit count. A persistent tier hit is
    /// promoted into the memory tier. Expired entries met on the way are
    /// removed from the tier they were found in. Absence counts as a miss.
    pub async fn get_with(&self, key: &str, check_persistent: bool) -> Option<T> {
        {
            let mut guard = self.inner.write().await;
            let inner = &mut *guard;
            let now = Utc::now();

            let expired = match inner.memory.get_mut(key) {
                Some(entry) if !entry.is_expired_at(now) => {
                    entry.record_hit();
                    let value = entry.value.clone();
                    inner.stats.record_hit();
                    debug!("Memory tier hit: {}", key);
                    return Some(value);
                }
                Some(_) => true,
                None => false,
            };

            if expired {
                inner.memory.remove(key);
                debug!("Removed expired memory entry: {}", key);
            }
        }

        if check_persistent {
            if let Some(value) = self.promote(key).await {
                return Some(value);
            }
        }

        self.inner.write().await.stats.record_miss();
        debug!("Cache miss: {}", key);
        None
    }

    // == Has ==
    /// Checks for a live value. Counts as a read in the statistics.
    pub async fn has(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    // == Delete ==
    /// Removes a key from both tiers. Deleting an absent key is a no-op.
    pub async fn delete(&self, key: &str) {
        {
            let mut guard = self.inner.write().await;
            guard.memory.remove(key);
        }

        if let Err(err) = self.store.delete(self.namespace(), key).await {
            warn!("Failed to delete '{}' from persistent tier: {}", key, err);
        }
    }

    // == Clear ==
    /// Empties the memory tier and the whole persistent tier namespace.
    ///
    /// Cleared memory entries are counted as evictions.
    pub async fn clear(&self) {
        let cleared = {
            let mut guard = self.inner.write().await;
            let inner = &mut *guard;
            let cleared = inner.memory.clear();
            inner.stats.record_evictions(cleared);
            cleared
        };

        if let Err(err) = self.store.clear(self.namespace()).await {
            warn!("Failed to clear persistent tier namespace '{}': {}", self.namespace(), err);
        }

        info!("Cache cleared ({} memory entries)", cleared);
    }

    // == Cleanup ==
    /// Sweeps expired entries out of both tiers.
    ///
    /// Returns the total number removed. If the persistent tier cannot be
    /// listed it is logged and contributes nothing to the count.
    pub async fn cleanup(&self) -> usize {
        let now = Utc::now();

        let memory_removed = {
            let mut guard = self.inner.write().await;
            sweep_memory(&mut guard.memory, now)
        };

        let durable_removed =
            match sweep_persistent::<T, P>(self.store.as_ref(), self.namespace(), now).await {
                Ok(removed) => removed,
                Err(err) => {
                    warn!("Persistent tier cleanup failed: {}", err);
                    0
                }
            };

        memory_removed + durable_removed
    }

    // == Get Or Set ==
    /// Cache-aside read.
    ///
    /// Returns the cached value if present. Otherwise awaits `supplier`,
    /// caches its value, and returns it. A supplier error is returned as-is
    /// and nothing is cached.
    pub async fn get_or_set<F, Fut, E>(
        &self,
        key: &str,
        supplier: F,
        ttl: Option<Duration>,
        persistent: bool,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<CacheError>,
    {
        validate_key(key)?;
        self.effective_ttl(ttl)?;

        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = supplier().await?;
        self.set(key, value.clone(), ttl, persistent).await?;
        Ok(value)
    }

    // == Set And Store ==
    /// Write-through.
    ///
    /// Runs `persist` against the backing store first. Only when it succeeds
    /// is the value cached in both tiers. On failure both tiers are left as
    /// they were.
    pub async fn set_and_store<F, Fut, E>(
        &self,
        key: &str,
        value: T,
        persist: F,
        ttl: Option<Duration>,
    ) -> std::result::Result<(), E>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: From<CacheError>,
    {
        validate_key(key)?;
        self.effective_ttl(ttl)?;

        persist(value.clone()).await?;
        self.set(key, value, ttl, true).await?;
        Ok(())
    }

    // == Invalidate ==
    /// Removes one key, or every key matching a pattern, from both tiers.
    ///
    /// Returns how many distinct keys were removed. Pattern matching looks at
    /// the keys of both tiers; if the persistent tier cannot be listed only
    /// memory keys are considered.
    pub async fn invalidate(&self, target: impl Into<Invalidation>) -> usize {
        let target = target.into();

        if let Invalidation::Key(key) = &target {
            return usize::from(self.invalidate_key(key).await);
        }

        let memory_keys = {
            let guard = self.inner.read().await;
            guard.memory.keys()
        };
        let durable_keys: Vec<String> = match self.store.get_all(self.namespace()).await {
            Ok(entries) => entries.into_iter().map(|entry| entry.key).collect(),
            Err(err) => {
                warn!("Failed to list persistent tier for invalidation: {}", err);
                Vec::new()
            }
        };

        let matched = matching_keys(
            &target,
            memory_keys.iter().map(String::as_str),
            durable_keys.iter().map(String::as_str),
        );

        for key in &matched {
            self.delete(key).await;
        }

        info!("Invalidated {} keys", matched.len());
        matched.len()
    }

    // == Stats ==
    /// Returns a snapshot of the counters and memory tier occupancy.
    pub async fn stats(&self) -> StatsReport {
        let guard = self.inner.read().await;
        StatsReport::new(&guard.stats, guard.memory.len(), guard.memory.max_entries())
    }

    pub async fn reset_stats(&self) {
        self.inner.write().await.stats.reset();
    }

    // == Set Max Size ==
    /// Changes the memory tier capacity, evicting at once if it is exceeded.
    pub async fn set_max_size(&self, max_entries: usize) {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let evicted = inner.memory.set_max_entries(max_entries);
        inner.stats.record_evictions(evicted.len());
        info!(
            "Memory tier capacity set to {} ({} evicted)",
            max_entries,
            evicted.len()
        );
    }

    // == Sizes ==
    /// Number of entries in the memory tier.
    pub async fn size(&self) -> usize {
        self.inner.read().await.memory.len()
    }

    /// Number of distinct keys held across both tiers, expired or not.
    ///
    /// Falls back to the memory tier alone if the persistent tier cannot be
    /// listed.
    pub async fn total_size(&self) -> usize {
        let mut keys: HashSet<String> = {
            let guard = self.inner.read().await;
            guard.memory.keys().into_iter().collect()
        };

        match self.store.get_all(self.namespace()).await {
            Ok(entries) => keys.extend(entries.into_iter().map(|entry| entry.key)),
            Err(err) => warn!("Failed to list persistent tier for size: {}", err),
        }

        keys.len()
    }

    // == Internal Helpers ==
    fn effective_ttl(&self, ttl: Option<Duration>) -> Result<Duration> {
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl);
        }
        Ok(ttl)
    }

    /// Update, falling back to add when the key is not stored yet.
    async fn upsert(&self, entry: &CacheEntry<T>) {
        let namespace = self.namespace();
        let result = match self.store.update(namespace, entry).await {
            Err(StoreError::NotFound(_)) => self.store.add(namespace, entry).await.map(|_| ()),
            other => other,
        };

        if let Err(err) = result {
            warn!("Failed to persist '{}': {}", entry.key, err);
        }
    }

    /// Looks `key` up in the persistent tier and promotes a live entry.
    async fn promote(&self, key: &str) -> Option<T> {
        let namespace = self.namespace();
        let mut entry = match self.store.get(namespace, key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(err) => {
                warn!("Persistent tier read failed for '{}': {}", key, err);
                return None;
            }
        };

        if entry.is_expired() {
            if let Err(err) = self.store.delete(namespace, key).await {
                warn!("Failed to delete expired '{}' from persistent tier: {}", key, err);
            }
            debug!("Removed expired persistent entry: {}", key);
            return None;
        }

        entry.record_hit();
        let value = entry.value.clone();

        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let evicted = inner.memory.insert(entry);
        inner.stats.record_evictions(evicted.len());
        inner.stats.record_hit();
        debug!("Promoted '{}' from persistent tier", key);

        Some(value)
    }

    /// Deletes one key from both tiers, reporting whether either held it.
    async fn invalidate_key(&self, key: &str) -> bool {
        let in_memory = {
            let mut guard = self.inner.write().await;
            guard.memory.remove(key).is_some()
        };

        let namespace = self.namespace();
        let in_store = match self.store.get(namespace, key).await {
            Ok(found) => found.is_some(),
            Err(err) => {
                warn!("Persistent tier read failed for '{}': {}", key, err);
                false
            }
        };

        if let Err(err) = self.store.delete(namespace, key).await {
            warn!("Failed to delete '{}' from persistent tier: {}", key, err);
        }

        in_memory || in_store
    }
}

// == Key Validation ==
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidKey(format!(
            "key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistent::InMemoryStore;

    type TestCache = TieredCache<String, InMemoryStore<String>>;

    fn cache(max: usize) -> (TestCache, Arc<InMemoryStore<String>>) {
        let store = Arc::new(InMemoryStore::new());
        let config = Config::default().with_max_memory_size(max);
        (TieredCache::new(store.clone(), config), store)
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (cache, _) = cache(100);

        cache.set("key1", "value1".to_string(), None, false).await.unwrap();

        assert_eq!(cache.get("key1").await.as_deref(), Some("value1"));
        assert_eq!(cache.size().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_key_and_ttl_rejected() {
        let (cache, _) = cache(100);

        let empty = cache.set("", "v".to_string(), None, false).await;
        assert!(matches!(empty, Err(CacheError::InvalidKey(_))));

        let long = cache.set("x".repeat(MAX_KEY_LENGTH + 1), "v".to_string(), None, false).await;
        assert!(matches!(long, Err(CacheError::InvalidKey(_))));

        let zero = cache.set("k", "v".to_string(), Some(Duration::ZERO), false).await;
        assert!(matches!(zero, Err(CacheError::InvalidTtl)));

        assert_eq!(cache.size().await, 0);
        assert_eq!(cache.stats().await.sets, 0);
    }

    #[tokio::test]
    async fn test_non_persistent_set_skips_store() {
        let (cache, store) = cache(100);

        cache.set("k", "v".to_string(), None, false).await.unwrap();

        assert_eq!(store.len("cache").await, 0);
    }

    #[tokio::test]
    async fn test_persistent_set_upserts() {
        let (cache, store) = cache(100);

        cache.set("k", "v1".to_string(), None, true).await.unwrap();
        cache.set("k", "v2".to_string(), None, true).await.unwrap();

        assert_eq!(store.len("cache").await, 1);
        let stored = store.get("cache", "k").await.unwrap().unwrap();
        assert_eq!(stored.value, "v2");
    }

    #[tokio::test]
    async fn test_get_without_persistent_fallback() {
        let (cache, store) = cache(100);
        let entry = CacheEntry::new("k", "durable".to_string(), Duration::from_secs(60));
        store.add("cache", &entry).await.unwrap();

        assert!(cache.get_with("k", false).await.is_none());
        assert_eq!(cache.get_with("k", true).await.as_deref(), Some("durable"));
    }

    #[tokio::test]
    async fn test_promotion_fills_memory_tier() {
        let (cache, store) = cache(100);
        let entry = CacheEntry::new("k", "durable".to_string(), Duration::from_secs(60));
        store.add("cache", &entry).await.unwrap();

        assert_eq!(cache.size().await, 0);
        assert_eq!(cache.get("k").await.as_deref(), Some("durable"));
        assert_eq!(cache.size().await, 1);

        // Now served from memory even with the store offline
        store.set_offline(true);
        assert_eq!(cache.get("k").await.as_deref(), Some("durable"));

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn test_expired_persistent_entry_is_deleted() {
        let (cache, store) = cache(100);
        let entry = CacheEntry::new("k", "old".to_string(), Duration::from_millis(5));
        store.add("cache", &entry).await.unwrap();

        tokio::time::sleep(Duration::from_millis(15)).await;

        assert!(cache.get("k").await.is_none());
        assert!(store.get("cache", "k").await.unwrap().is_none());
        assert_eq!(cache.stats().await.misses, 1);
    }

    #[tokio::test]
    async fn test_store_outage_does_not_fail_calls() {
        let (cache, store) = cache(100);
        store.set_offline(true);

        cache.set("k", "v".to_string(), None, true).await.unwrap();
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
        assert!(cache.get("missing").await.is_none());
        cache.delete("k").await;
        cache.clear().await;
        assert_eq!(cache.cleanup().await, 0);
        assert_eq!(cache.total_size().await, 0);
    }

    #[tokio::test]
    async fn test_clear_counts_evictions() {
        let (cache, store) = cache(100);
        cache.set("a", "1".to_string(), None, true).await.unwrap();
        cache.set("b", "2".to_string(), None, false).await.unwrap();

        cache.clear().await;

        assert_eq!(cache.size().await, 0);
        assert_eq!(store.len("cache").await, 0);
        assert_eq!(cache.stats().await.evictions, 2);
    }

    #[tokio::test]
    async fn test_set_max_size_evicts_immediately() {
        let (cache, _) = cache(10);
        for i in 0..10 {
            cache.set(format!("k{i}"), "v".to_string(), None, false).await.unwrap();
        }

        cache.set_max_size(4).await;

        let stats = cache.stats().await;
        assert_eq!(stats.memory_size, 4);
        assert_eq!(stats.max_memory_size, 4);
        assert_eq!(stats.evictions, 6);
    }

    #[tokio::test]
    async fn test_total_size_counts_distinct_keys() {
        let (cache, store) = cache(100);
        cache.set("both", "v".to_string(), None, true).await.unwrap();
        cache.set("memory", "v".to_string(), None, false).await.unwrap();
        let entry = CacheEntry::new("durable", "v".to_string(), Duration::from_secs(60));
        store.add("cache", &entry).await.unwrap();

        assert_eq!(cache.size().await, 2);
        assert_eq!(cache.total_size().await, 3);
    }

    #[tokio::test]
    async fn test_invalidate_exact_key() {
        let (cache, _) = cache(100);
        cache.set("user:1", "a".to_string(), None, true).await.unwrap();

        assert_eq!(cache.invalidate("user:1").await, 1);
        assert_eq!(cache.invalidate("user:1").await, 0);
        assert!(cache.get("user:1").await.is_none());
    }

    #[tokio::test]
    async fn test_reset_stats() {
        let (cache, _) = cache(100);
        cache.set("k", "v".to_string(), None, false).await.unwrap();
        cache.get("k").await;
        cache.get("missing").await;

        cache.reset_stats().await;

        let stats = cache.stats().await;
        assert_eq!((stats.hits, stats.misses, stats.sets, stats.evictions), (0, 0, 0, 0));
        assert_eq!(stats.memory_size, 1);
    }

    #[tokio::test]
    async fn test_get_or_set_zero_ttl_skips_supplier() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let (cache, _) = cache(100);
        let calls = AtomicUsize::new(0);

        let result = cache
            .get_or_set(
                "k",
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, CacheError>("v".to_string())
                },
                Some(Duration::ZERO),
                false,
            )
            .await;

        assert!(matches!(result, Err(CacheError::InvalidTtl)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!cache.has("k").await);
    }
}
