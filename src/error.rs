//! Error types for the tiered cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Store Error Enum ==
/// Errors raised by a persistent tier adapter.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Key is absent from the namespace (returned by `update`)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key already exists in the namespace (returned by `add`)
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Namespace name cannot be used by this adapter
    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    /// Underlying filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store is temporarily unreachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// A missing key is never an error: reads return `None` instead.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is empty or longer than the allowed maximum
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// TTL must be strictly positive
    #[error("TTL must be greater than zero")]
    InvalidTtl,

    /// Invalidation pattern failed to compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

// == Result Type Aliases ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Result type returned by persistent tier adapters.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
