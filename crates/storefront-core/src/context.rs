//! Per-request render context.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use storefront_cache::CacheStore;

use crate::request::RequestId;

/// Shared handle to the cache store configured for a deployment.
pub type CacheHandle = Arc<dyn CacheStore>;

/// Environment configuration visible to the rendering engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Development mode.
    #[serde(default)]
    pub dev: bool,
}

impl RenderConfig {
    /// Development configuration.
    pub fn dev() -> Self {
        Self { dev: true }
    }

    /// Production configuration.
    pub fn production() -> Self {
        Self { dev: false }
    }
}

/// Opaque value supplied by the host and passed through to the rendering
/// engine without inspection.
#[derive(Clone, Default)]
pub struct ContextValue(Option<Arc<dyn Any + Send + Sync>>);

impl ContextValue {
    /// Wrap a host value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Some(Arc::new(value)))
    }

    /// No value.
    pub fn empty() -> Self {
        Self(None)
    }

    /// Borrow the value as `T`, if it is one.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|v| v.downcast_ref::<T>())
    }

    /// Check if no value was supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("ContextValue(..)"),
            None => f.write_str("ContextValue(empty)"),
        }
    }
}

/// Cache handle, context value and config for one dispatch.
///
/// Built at dispatch entry and passed explicitly to every collaborator, so
/// concurrent dispatches never observe each other's values.
#[derive(Clone)]
pub struct RenderContext {
    request_id: RequestId,
    cache: Option<CacheHandle>,
    value: ContextValue,
    config: RenderConfig,
}

impl RenderContext {
    /// Initialize the context for a dispatch.
    pub fn initialize(
        request_id: RequestId,
        cache: Option<CacheHandle>,
        value: ContextValue,
        config: RenderConfig,
    ) -> Self {
        Self {
            request_id,
            cache,
            value,
            config,
        }
    }

    /// Request this context belongs to.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Cache store for subrequests, if one is configured.
    pub fn cache(&self) -> Option<&CacheHandle> {
        self.cache.as_ref()
    }

    /// Host-supplied context value.
    pub fn value(&self) -> &ContextValue {
        &self.value
    }

    /// Environment configuration.
    pub fn config(&self) -> RenderConfig {
        self.config
    }

    /// Development mode.
    pub fn is_dev(&self) -> bool {
        self.config.dev
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("request_id", &self.request_id)
            .field("cache", &self.cache.is_some())
            .field("value", &self.value)
            .field("config", &self.config)
            .finish()
    }
}
