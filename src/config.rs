//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::DEFAULT_NAMESPACE;

/// Default TTL applied when a write does not specify one (one hour)
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
/// Default memory tier capacity
pub const DEFAULT_MAX_MEMORY_SIZE: usize = 100;
/// Default share of capacity evicted per eviction trigger
pub const DEFAULT_EVICTION_BATCH_FRACTION: f64 = 0.2;
/// Default interval between background cleanup sweeps
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL for entries written without an explicit TTL
    pub default_ttl: Duration,
    /// Maximum number of entries the memory tier can hold
    pub max_memory_size: usize,
    /// Fraction of `max_memory_size` evicted each time capacity is exceeded
    pub eviction_batch_fraction: f64,
    /// Persistent tier namespace the cache reads and writes
    pub namespace: String,
    /// Background cleanup task interval
    pub cleanup_interval: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 3600000)
    /// - `CACHE_MAX_MEMORY_SIZE` - Memory tier capacity (default: 100)
    /// - `CACHE_EVICTION_BATCH_FRACTION` - Eviction batch share in (0, 1] (default: 0.2)
    /// - `CACHE_NAMESPACE` - Persistent tier namespace (default: "cache")
    /// - `CACHE_CLEANUP_INTERVAL_MS` - Cleanup frequency in milliseconds (default: 60000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            default_ttl: env::var("CACHE_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.default_ttl),
            max_memory_size: env::var("CACHE_MAX_MEMORY_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_memory_size),
            eviction_batch_fraction: env::var("CACHE_EVICTION_BATCH_FRACTION")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|f| is_valid_fraction(*f))
                .unwrap_or(defaults.eviction_batch_fraction),
            namespace: env::var("CACHE_NAMESPACE")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.namespace),
            cleanup_interval: env::var("CACHE_CLEANUP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Set the default TTL. A zero duration keeps the current value.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        if !ttl.is_zero() {
            self.default_ttl = ttl;
        }
        self
    }

    /// Set the memory tier capacity.
    pub fn with_max_memory_size(mut self, max: usize) -> Self {
        self.max_memory_size = max;
        self
    }

    /// Set the eviction batch fraction. Values outside (0, 1] keep the current value.
    pub fn with_eviction_batch_fraction(mut self, fraction: f64) -> Self {
        if is_valid_fraction(fraction) {
            self.eviction_batch_fraction = fraction;
        }
        self
    }

    /// Set the persistent tier namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the background cleanup interval.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            max_memory_size: DEFAULT_MAX_MEMORY_SIZE,
            eviction_batch_fraction: DEFAULT_EVICTION_BATCH_FRACTION,
            namespace: DEFAULT_NAMESPACE.to_string(),
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

fn is_valid_fraction(fraction: f64) -> bool {
    fraction > 0.0 && fraction <= 1.0
}
