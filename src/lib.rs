//! Tiered Cache - A two-tier key/value cache
//!
//! A bounded in-process memory tier in front of a durable, namespaced
//! persistent tier, with TTL expiration, hit-count batch eviction,
//! cache-aside, write-through, pattern invalidation, and batch prefetch.

pub mod cache;
pub mod config;
pub mod error;
pub mod persistent;
pub mod tasks;

pub use cache::{Invalidation, PrefetchItem, StatsReport, TieredCache};
pub use config::Config;
pub use error::{CacheError, StoreError};
pub use persistent::{InMemoryStore, JsonFileStore, PersistentTier};
pub use tasks::spawn_cleanup_task;
