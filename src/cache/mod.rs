//! Cache Module
//!
//! Two-tier caching with TTL expiration and hit-count batch eviction.

mod entry;
mod eviction;
pub mod expiry;
pub mod invalidate;
mod memory;
mod order;
mod prefetch;
mod stats;
mod tiered;


// Re-export public types
pub use entry::CacheEntry;
pub use eviction::EvictionPolicy;
pub use invalidate::Invalidation;
pub use memory::MemoryTier;
pub use order::InsertionOrder;
pub use prefetch::{PrefetchItem, PrefetchOutcome, WarmupReport};
pub use stats::{CacheStats, StatsReport};
pub use tiered::TieredCache;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Persistent tier namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "cache";
