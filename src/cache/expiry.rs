//! Expiry Scanner Module
//!
//! Full sweeps that drop expired entries from either tier. `get` never runs
//! these; it only removes the single expired key it touches.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::cache::MemoryTier;
use crate::error::StoreResult;
use crate::persistent::PersistentTier;

// == Sweep Memory ==
/// Removes every memory tier entry that had expired at `now`.
///
/// Returns the number of entries removed.
pub fn sweep_memory<T>(tier: &mut MemoryTier<T>, now: DateTime<Utc>) -> usize {
    let expired: Vec<String> = tier
        .iter()
        .filter(|(_, entry)| entry.is_expired_at(now))
        .map(|(key, _)| key.clone())
        .collect();

    expired
        .iter()
        .filter(|key| tier.remove(key).is_some())
        .count()
}

// == Sweep Persistent ==
/// Removes every expired entry from one persistent tier namespace.
///
/// Returns the number of entries deleted. Fails only when the namespace
/// cannot be listed; a failed delete is logged and the sweep moves on.
pub async fn sweep_persistent<T, P>(store: &P, namespace: &str, now: DateTime<Utc>) -> StoreResult<usize>
where
    T: Send + Sync + 'static,
    P: PersistentTier<T> + ?Sized,
{
    let mut removed = 0;
    for entry in store.get_all(namespace).await? {
        if !entry.is_expired_at(now) {
            continue;
        }
        match store.delete(namespace, &entry.key).await {
            Ok(()) => removed += 1,
            Err(err) => warn!("Failed to delete expired key '{}': {}", entry.key, err),
        }
    }
    Ok(removed)
}
