//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Expiry Cleanup: Sweeps expired entries out of both tiers at a fixed interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
