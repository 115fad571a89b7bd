//! Cache error types.

use thiserror::Error;

/// Errors that can occur when using a cache store.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The store's internal lock was poisoned by a panicking writer.
    #[error("Cache store lock poisoned")]
    Poisoned,

    /// Failed to perform store operation.
    #[error("Store operation failed: {0}")]
    StoreError(String),
}

/// Result type for cache store operations.
pub type CacheResult<T> = Result<T, CacheError>;
