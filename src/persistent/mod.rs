//! Persistent Tier Module
//!
//! The durable, namespaced key/value store behind the memory tier, reached
//! only through the [`PersistentTier`] trait.
//!
//! # Adapters
//! - [`InMemoryStore`]: process-local store, useful for tests and composition
//! - [`JsonFileStore`]: one JSON document per namespace on disk

mod file;
mod memory;

use async_trait::async_trait;

use crate::cache::CacheEntry;
use crate::error::StoreResult;

pub use file::JsonFileStore;
pub use memory::InMemoryStore;

// == Persistent Tier Trait ==
/// Async, namespaced storage for cache entries.
///
/// Implementations own serialization of `T` and their own concurrency
/// control. The cache tolerates last-write-wins semantics from them.
#[async_trait]
pub trait PersistentTier<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Fetches the entry stored under `key`, expired or not.
    async fn get(&self, namespace: &str, key: &str) -> StoreResult<Option<CacheEntry<T>>>;

    /// Inserts a new entry and returns its record id.
    ///
    /// Fails with `StoreError::DuplicateKey` if the key is already present.
    async fn add(&self, namespace: &str, entry: &CacheEntry<T>) -> StoreResult<u64>;

    /// Replaces an existing entry.
    ///
    /// Fails with `StoreError::NotFound` if the key is absent.
    async fn update(&self, namespace: &str, entry: &CacheEntry<T>) -> StoreResult<()>;

    /// Removes the entry under `key`. Removing an absent key succeeds.
    async fn delete(&self, namespace: &str, key: &str) -> StoreResult<()>;

    /// Returns every entry in the namespace.
    async fn get_all(&self, namespace: &str) -> StoreResult<Vec<CacheEntry<T>>>;

    /// Removes every entry in the namespace.
    async fn clear(&self, namespace: &str) -> StoreResult<()>;
}
