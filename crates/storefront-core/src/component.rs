//! Response state set by components while rendering.

use http::{header, HeaderMap, HeaderValue, StatusCode};
use storefront_cache::CachingStrategy;

use crate::error::CoreError;

/// Status, headers, cache policy and optional body override produced by
/// `render`.
#[derive(Debug, Clone, Default)]
pub struct ComponentResponse {
    headers: HeaderMap,
    status: Option<StatusCode>,
    caching: CachingStrategy,
    custom_body: Option<Vec<u8>>,
}

impl ComponentResponse {
    /// Create an empty component response with the default caching strategy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Explicit status, if one was set.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Set the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Set the caching strategy.
    pub fn cache(&mut self, strategy: CachingStrategy) {
        self.caching = strategy;
    }

    /// Current caching strategy.
    pub fn caching(&self) -> &CachingStrategy {
        &self.caching
    }

    /// Cache-control directive for the current strategy.
    pub fn cache_control_header(&self) -> String {
        self.caching.cache_control_header()
    }

    /// Replace the rendered document with a body sent verbatim.
    pub fn send(&mut self, body: impl Into<Vec<u8>>) {
        self.custom_body = Some(body.into());
    }

    /// Body override, if one was sent.
    pub fn custom_body(&self) -> Option<&[u8]> {
        self.custom_body.as_deref()
    }

    /// Temporary redirect (307) to `location`.
    pub fn redirect(&mut self, location: &str) -> Result<(), CoreError> {
        self.redirect_with_status(location, StatusCode::TEMPORARY_REDIRECT)
    }

    /// Redirect to `location` with an explicit status.
    pub fn redirect_with_status(
        &mut self,
        location: &str,
        status: StatusCode,
    ) -> Result<(), CoreError> {
        let value = HeaderValue::try_from(location)?;
        self.headers.insert(header::LOCATION, value);
        self.status = Some(status);
        self.custom_body = Some(Vec::new());
        Ok(())
    }

    /// Split into status, headers and custom body.
    pub fn into_parts(self) -> (Option<StatusCode>, HeaderMap, Option<Vec<u8>>) {
        (self.status, self.headers, self.custom_body)
    }
}
