//! Eviction Policy Module
//!
//! Chooses which memory tier entries to drop once capacity is exceeded.

use crate::cache::CacheEntry;
use crate::config::DEFAULT_EVICTION_BATCH_FRACTION;

// == Eviction Policy ==
/// Least-hit-count batch eviction.
///
/// Candidates are ranked ascending by `hit_count`, then by `created_at`, then
/// by insertion order. Recency of access plays no part in the ranking.
#[derive(Debug, Clone, Copy)]
pub struct EvictionPolicy {
    /// Share of capacity removed per trigger
    batch_fraction: f64,
}

impl EvictionPolicy {
    // == Constructor ==
    /// Creates a policy evicting `batch_fraction` of capacity per trigger.
    ///
    /// Fractions outside (0, 1] fall back to the default of 0.2.
    pub fn new(batch_fraction: f64) -> Self {
        let batch_fraction = if batch_fraction > 0.0 && batch_fraction <= 1.0 {
            batch_fraction
        } else {
            DEFAULT_EVICTION_BATCH_FRACTION
        };
        Self { batch_fraction }
    }

    pub fn batch_fraction(&self) -> f64 {
        self.batch_fraction
    }

    // == Batch Size ==
    /// Returns `ceil(max_entries * batch_fraction)`.
    pub fn batch_size(&self, max_entries: usize) -> usize {
        let raw = max_entries as f64 * self.batch_fraction;
        let rounded = raw.round();
        // 100 * 0.2 must give 20, not 21
        if (raw - rounded).abs() < 1e-9 {
            rounded as usize
        } else {
            raw.ceil() as usize
        }
    }

    // == Select Victims ==
    /// Picks the keys to evict from `entries`, which must be in insertion order.
    ///
    /// Returns nothing while `len <= max_entries`. Otherwise returns a full
    /// batch, never less than the excess over capacity and never more than
    /// `len`.
    pub fn select_victims<'a, T, I>(&self, entries: I, len: usize, max_entries: usize) -> Vec<String>
    where
        T: 'a,
        I: IntoIterator<Item = (&'a String, &'a CacheEntry<T>)>,
    {
        if len <= max_entries {
            return Vec::new();
        }

        let count = self
            .batch_size(max_entries)
            .max(len - max_entries)
            .min(len);

        let mut ranked: Vec<(&String, &CacheEntry<T>)> = entries.into_iter().collect();
        // Stable sort keeps insertion order for full ties
        ranked.sort_by(|(_, a), (_, b)| {
            a.hit_count
                .cmp(&b.hit_count)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        ranked
            .into_iter()
            .take(count)
            .map(|(key, _)| key.clone())
            .collect()
    }
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_EVICTION_BATCH_FRACTION)
    }
}
