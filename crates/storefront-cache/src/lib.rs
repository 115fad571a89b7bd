//! Caching infrastructure for the storefront request dispatcher.
//!
//! This crate provides:
//! - `CachingStrategy` - Cache-control policy attached to a component response
//! - `cache_control_header_name` - Environment-specific cache-control header
//! - `CacheStore` - Interface of the cache handle passed through render context
//! - `InMemoryCacheStore` - Process-local store for development and tests
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use storefront_cache::{CachingStrategy, cache_control_header_name};
//!
//! let strategy = CachingStrategy::hours().with_stale_if_error(Duration::from_secs(60));
//! headers.insert(cache_control_header_name(false), strategy.cache_control_header().parse()?);
//! ```

mod error;
mod headers;
mod policy;
mod store;

pub use error::*;
pub use headers::*;
pub use policy::*;
pub use store::*;
