//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A single cached value with its lifetime metadata.
///
/// The same record shape is held by the memory tier and handed to persistent
/// tier adapters, which decide how to encode it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    /// Cache key, never empty
    pub key: String,
    /// The stored value
    pub value: T,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Expiration timestamp, always later than `created_at`
    pub expires_at: DateTime<Utc>,
    /// Successful reads served from this entry
    pub hit_count: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    ///
    /// # Arguments
    /// * `key` - The key to store under
    /// * `value` - The value to store
    /// * `ttl` - Time to live, expected to be non-zero
    pub fn new(key: impl Into<String>, value: T, ttl: Duration) -> Self {
        Self::new_at(key, value, ttl, Utc::now())
    }

    /// Creates a new cache entry as if it had been written at `now`.
    pub fn new_at(key: impl Into<String>, value: T, ttl: Duration, now: DateTime<Utc>) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            key: key.into(),
            value,
            created_at: now,
            expires_at,
            hit_count: 0,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry had expired at `now`.
    ///
    /// An entry stays live up to and including its expiration instant; it is
    /// expired once `expires_at < now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Checks whether the entry has expired as of the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    // == Record Hit ==
    /// Counts one successful read of this entry.
    pub fn record_hit(&mut self) {
        self.hit_count = self.hit_count.saturating_add(1);
    }
}
