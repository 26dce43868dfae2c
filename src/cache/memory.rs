//! Memory Tier Module
//!
//! Bounded in-process map from key to entry with synchronous eviction.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::{CacheEntry, EvictionPolicy, InsertionOrder};

// == Memory Tier ==
/// Fast tier of the cache.
///
/// Every mutating call leaves `len() <= max_entries()` before it returns.
/// Expiry is not checked here; callers decide what an expired entry means.
#[derive(Debug)]
pub struct MemoryTier<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// First-insertion order of keys
    order: InsertionOrder,
    /// Victim selection
    policy: EvictionPolicy,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl<T> MemoryTier<T> {
    // == Constructor ==
    /// Creates an empty tier holding at most `max_entries` entries.
    pub fn new(max_entries: usize, policy: EvictionPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            policy,
            max_entries,
        }
    }

    // == Insert ==
    /// Inserts or overwrites an entry, then evicts if capacity is exceeded.
    ///
    /// Returns the evicted entries, which may include the one just inserted.
    pub fn insert(&mut self, entry: CacheEntry<T>) -> Vec<CacheEntry<T>> {
        self.order.record(&entry.key);
        self.entries.insert(entry.key.clone(), entry);
        self.evict_if_needed()
    }

    // == Get ==
    pub fn get(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut CacheEntry<T>> {
        self.entries.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Remove ==
    /// Removes an entry by key. Removing an absent key is a no-op.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry<T>> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.order.remove(key);
        }
        removed
    }

    // == Iterate ==
    /// Iterates `(key, entry)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CacheEntry<T>)> {
        self.order
            .iter()
            .filter_map(move |key| self.entries.get_key_value(key))
    }

    /// Returns a snapshot of all keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }

    // == Clear ==
    /// Drops every entry and returns how many were held.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.order.clear();
        count
    }

    // == Capacity ==
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Changes the capacity and evicts immediately if the tier is now over it.
    pub fn set_max_entries(&mut self, max_entries: usize) -> Vec<CacheEntry<T>> {
        self.max_entries = max_entries;
        self.evict_if_needed()
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_if_needed(&mut self) -> Vec<CacheEntry<T>> {
        let victims = self
            .policy
            .select_victims(self.iter(), self.len(), self.max_entries);

        if !victims.is_empty() {
            debug!(
                "Memory tier over capacity ({} > {}), evicting {} entries",
                self.len(),
                self.max_entries,
                victims.len()
            );
        }

        victims
            .into_iter()
            .filter_map(|key| self.remove(&key))
            .collect()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tier(max: usize) -> MemoryTier<String> {
        MemoryTier::new(max, EvictionPolicy::default())
    }

    fn entry(key: &str, value: &str) -> CacheEntry<String> {
        CacheEntry::new(key, value.to_string(), Duration::from_secs(300))
    }

    #[test]
    fn test_insert_and_get() {
        let mut tier = tier(100);

        assert!(tier.insert(entry("key1", "value1")).is_empty());

        assert_eq!(tier.get("key1").map(|e| e.value.as_str()), Some("value1"));
        assert_eq!(tier.len(), 1);
    }

    #[test]
    fn test_overwrite_keeps_single_entry_and_position() {
        let mut tier = tier(100);

        tier.insert(entry("a", "1"));
        tier.insert(entry("b", "2"));
        tier.insert(entry("a", "3"));

        assert_eq!(tier.len(), 2);
        assert_eq!(tier.get("a").unwrap().value, "3");
        assert_eq!(tier.keys(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut tier = tier(100);

        tier.insert(entry("key1", "value1"));
        assert!(tier.remove("key1").is_some());
        assert!(tier.remove("key1").is_none());
        assert!(tier.is_empty());
    }

    #[test]
    fn test_iter_in_insertion_order() {
        let mut tier = tier(100);
        for key in ["c", "a", "b"] {
            tier.insert(entry(key, key));
        }

        let keys: Vec<&str> = tier.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
        // Restartable
        assert_eq!(tier.iter().count(), 3);
    }

    #[test]
    fn test_insert_over_capacity_evicts_batch() {
        let mut tier = tier(10);
        for i in 0..10 {
            tier.insert(entry(&format!("key{i}"), "v"));
        }
        tier.get_mut("key0").unwrap().record_hit();

        let evicted = tier.insert(entry("key10", "v"));

        // ceil(10 * 0.2) = 2, lowest hit count first, key0 protected by its hit
        let evicted_keys: Vec<&str> = evicted.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(evicted_keys, vec!["key1", "key2"]);
        assert_eq!(tier.len(), 9);
        assert!(tier.contains("key0"));
        assert!(tier.contains("key10"));
    }

    #[test]
    fn test_shrinking_capacity_evicts_immediately() {
        let mut tier = tier(10);
        for i in 0..10 {
            tier.insert(entry(&format!("key{i}"), "v"));
        }

        let evicted = tier.set_max_entries(3);

        assert_eq!(evicted.len(), 7);
        assert_eq!(tier.len(), 3);
        assert_eq!(tier.max_entries(), 3);
    }

    #[test]
    fn test_clear_returns_count() {
        let mut tier = tier(10);
        tier.insert(entry("a", "1"));
        tier.insert(entry("b", "2"));

        assert_eq!(tier.clear(), 2);
        assert!(tier.is_empty());
        assert!(tier.keys().is_empty());
    }
}
