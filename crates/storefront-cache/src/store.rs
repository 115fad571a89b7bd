//! Cache store interface and an in-memory implementation.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::{CacheError, CacheResult};
use crate::policy::CachingStrategy;

/// A response held by a cache store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
}

impl CachedResponse {
    /// Create a cached response with no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The stored response.
    pub response: CachedResponse,
    /// Past max-age but still inside the stale-while-revalidate window.
    pub stale: bool,
}

/// Cache handle made available to the rendering engine and its subrequests.
///
/// The dispatcher never inspects the store; it only carries it in the
/// render context.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a response.
    async fn get(&self, key: &str) -> CacheResult<Option<CacheEntry>>;

    /// Store a response under the given strategy. Strategies that are not
    /// storable are ignored.
    async fn put(
        &self,
        key: &str,
        response: CachedResponse,
        strategy: &CachingStrategy,
    ) -> CacheResult<()>;

    /// Remove a response. Returns whether an entry existed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;
}

#[derive(Debug)]
struct StoredEntry {
    response: CachedResponse,
    // `None` when the lifetime runs past what `Instant` can represent.
    fresh_until: Option<Instant>,
    expires_at: Option<Instant>,
}

/// In-memory cache store for local development and tests.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl InMemoryCacheStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<CacheEntry>> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;

        let Some(stored) = entries.get(key) else {
            return Ok(None);
        };

        if stored.expires_at.is_some_and(|at| now >= at) {
            entries.remove(key);
            return Ok(None);
        }

        Ok(Some(CacheEntry {
            response: stored.response.clone(),
            stale: stored.fresh_until.is_some_and(|at| now >= at),
        }))
    }

    async fn put(
        &self,
        key: &str,
        response: CachedResponse,
        strategy: &CachingStrategy,
    ) -> CacheResult<()> {
        let Some(lifetime) = strategy.storable_for() else {
            return Ok(());
        };

        let now = Instant::now();
        let fresh = strategy.max_age.unwrap_or(Duration::ZERO);
        let entry = StoredEntry {
            response,
            fresh_until: now.checked_add(fresh),
            expires_at: now.checked_add(lifetime),
        };

        self.entries
            .write()
            .map_err(|_| CacheError::Poisoned)?
            .insert(key.to_string(), entry);

        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let removed = self
            .entries
            .write()
            .map_err(|_| CacheError::Poisoned)?
            .remove(key)
            .is_some();
        Ok(removed)
    }
}
