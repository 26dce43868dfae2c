//! In-memory persistent tier adapter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::PersistentTier;
use crate::cache::CacheEntry;
use crate::error::{StoreError, StoreResult};

/// A stored entry and the id it was assigned by `add`.
#[derive(Debug, Clone)]
struct Record<T> {
    id: u64,
    entry: CacheEntry<T>,
}

#[derive(Debug)]
struct State<T> {
    namespaces: HashMap<String, HashMap<String, Record<T>>>,
    next_id: u64,
}

// == In-Memory Store ==
/// Namespaced store kept in process memory.
///
/// Behaves like a durable tier without surviving restarts. It can be switched
/// offline to exercise the cache's handling of an unreachable store.
#[derive(Debug)]
pub struct InMemoryStore<T> {
    state: RwLock<State<T>>,
    offline: AtomicBool,
}

impl<T> InMemoryStore<T> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                namespaces: HashMap::new(),
                next_id: 1,
            }),
            offline: AtomicBool::new(false),
        }
    }

    // == Availability ==
    /// While offline, every call fails with `StoreError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of entries held in `namespace`.
    pub async fn len(&self, namespace: &str) -> usize {
        self.state
            .read()
            .await
            .namespaces
            .get(namespace)
            .map_or(0, HashMap::len)
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> PersistentTier<T> for InMemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn get(&self, namespace: &str, key: &str) -> StoreResult<Option<CacheEntry<T>>> {
        self.check_online()?;
        let state = self.state.read().await;
        Ok(state
            .namespaces
            .get(namespace)
            .and_then(|records| records.get(key))
            .map(|record| record.entry.clone()))
    }

    async fn add(&self, namespace: &str, entry: &CacheEntry<T>) -> StoreResult<u64> {
        self.check_online()?;
        let mut state = self.state.write().await;
        let id = state.next_id;
        let records = state.namespaces.entry(namespace.to_string()).or_default();

        if records.contains_key(&entry.key) {
            return Err(StoreError::DuplicateKey(entry.key.clone()));
        }
        records.insert(
            entry.key.clone(),
            Record {
                id,
                entry: entry.clone(),
            },
        );
        state.next_id += 1;
        Ok(id)
    }

    async fn update(&self, namespace: &str, entry: &CacheEntry<T>) -> StoreResult<()> {
        self.check_online()?;
        let mut state = self.state.write().await;
        match state
            .namespaces
            .get_mut(namespace)
            .and_then(|records| records.get_mut(&entry.key))
        {
            Some(record) => {
                record.entry = entry.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(entry.key.clone())),
        }
    }

    async fn delete(&self, namespace: &str, key: &str) -> StoreResult<()> {
        self.check_online()?;
        let mut state = self.state.write().await;
        if let Some(records) = state.namespaces.get_mut(namespace) {
            records.remove(key);
        }
        Ok(())
    }

    async fn get_all(&self, namespace: &str) -> StoreResult<Vec<CacheEntry<T>>> {
        self.check_online()?;
        let state = self.state.read().await;
        let mut records: Vec<&Record<T>> = state
            .namespaces
            .get(namespace)
            .map(|records| records.values().collect())
            .unwrap_or_default();
        records.sort_by_key(|record| record.id);
        Ok(records.into_iter().map(|record| record.entry.clone()).collect())
    }

    async fn clear(&self, namespace: &str) -> StoreResult<()> {
        self.check_online()?;
        let mut state = self.state.write().await;
        state.namespaces.remove(namespace);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entry(key: &str, value: i32) -> CacheEntry<i32> {
        CacheEntry::new(key, value, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_add_then_get() {
        let store = InMemoryStore::new();

        let id = store.add("ns", &entry("a", 1)).await.unwrap();
        assert_eq!(id, 1);

        let found = store.get("ns", "a").await.unwrap().unwrap();
        assert_eq!(found.value, 1);
        assert!(store.get("other", "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_duplicate_fails() {
        let store = InMemoryStore::new();
        store.add("ns", &entry("a", 1)).await.unwrap();

        let result = store.add("ns", &entry("a", 2)).await;
        assert!(matches!(result, Err(StoreError::DuplicateKey(_))));
    }

    #[tokio::test]
    async fn test_update_missing_fails_with_not_found() {
        let store = InMemoryStore::new();

        let result = store.update("ns", &entry("a", 1)).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));

        store.add("ns", &entry("a", 1)).await.unwrap();
        store.update("ns", &entry("a", 5)).await.unwrap();
        assert_eq!(store.get("ns", "a").await.unwrap().unwrap().value, 5);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryStore::new();
        store.add("ns", &entry("a", 1)).await.unwrap();

        store.delete("ns", "a").await.unwrap();
        store.delete("ns", "a").await.unwrap();
        store.delete("missing", "a").await.unwrap();
        assert_eq!(store.len("ns").await, 0);
    }

    #[tokio::test]
    async fn test_get_all_in_insertion_order_and_clear() {
        let store = InMemoryStore::new();
        store.add("ns", &entry("b", 2)).await.unwrap();
        store.add("ns", &entry("a", 1)).await.unwrap();
        store.add("other", &entry("c", 3)).await.unwrap();

        let keys: Vec<String> = store
            .get_all("ns")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);

        store.clear("ns").await.unwrap();
        assert!(store.get_all("ns").await.unwrap().is_empty());
        assert_eq!(store.len("other").await, 1);
    }

    #[tokio::test]
    async fn test_offline_store_fails() {
        let store = InMemoryStore::<i32>::new();
        store.set_offline(true);

        assert!(matches!(
            store.get("ns", "a").await,
            Err(StoreError::Unavailable(_))
        ));

        store.set_offline(false);
        assert!(store.get("ns", "a").await.unwrap().is_none());
    }
}
