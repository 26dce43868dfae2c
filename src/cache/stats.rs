//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, sets, and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Process-lifetime cache counters. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from either tier
    pub hits: u64,
    /// Reads that found nothing live in either tier
    pub misses: u64,
    /// Successful writes
    pub sets: u64,
    /// Memory tier entries removed by capacity eviction or `clear`
    pub evictions: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    // == Record Evictions ==
    /// Adds `count` to the eviction counter.
    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    // == Reset ==
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// == Stats Report ==
/// Snapshot returned by `TieredCache::stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub evictions: u64,
    /// Percentage with two decimals, e.g. "75.00%"
    pub hit_rate: String,
    /// Entries currently in the memory tier
    pub memory_size: usize,
    /// Memory tier capacity
    pub max_memory_size: usize,
}

impl StatsReport {
    /// Builds a report from counters and memory tier occupancy.
    pub fn new(stats: &CacheStats, memory_size: usize, max_memory_size: usize) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            sets: stats.sets,
            evictions: stats.evictions,
            hit_rate: format!("{:.2}%", stats.hit_rate() * 100.0),
            memory_size,
            max_memory_size,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.sets, 0);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_record_evictions() {
        let mut stats = CacheStats::new();
        stats.record_evictions(2);
        stats.record_evictions(3);
        assert_eq!(stats.evictions, 5);
    }

    #[test]
    fn test_reset() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_set();
        stats.record_evictions(4);
        stats.reset();
        assert_eq!(stats, CacheStats::new());
    }

    #[test]
    fn test_report_formats_hit_rate() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();

        let report = StatsReport::new(&stats, 4, 100);
        assert_eq!(report.hit_rate, "75.00%");
        assert_eq!(report.memory_size, 4);
        assert_eq!(report.max_memory_size, 100);
    }

    #[test]
    fn test_report_zero_requests() {
        let report = StatsReport::new(&CacheStats::new(), 0, 100);
        assert_eq!(report.hit_rate, "0.00%");
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = StatsReport::new(&CacheStats::new(), 1, 10);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["hitRate"], "0.00%");
        assert_eq!(json["memorySize"], 1);
        assert_eq!(json["maxMemorySize"], 10);
    }
}
