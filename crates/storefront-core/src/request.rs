//! Incoming request representation.

use std::borrow::Cow;
use std::sync::atomic::{AtomicU32, Ordering};

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use url::Url;

use crate::error::CoreError;

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        let id = format!(
            "{:x}-{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        Self(id)
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The request being dispatched.
///
/// Owned by the server adapter and borrowed by the dispatcher; it is not
/// modified during dispatch.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl IncomingRequest {
    /// Create a request from an absolute URL.
    pub fn new(method: Method, url: &str) -> Result<Self, CoreError> {
        let url = Url::parse(url).map_err(|source| CoreError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        Ok(Self {
            request_id: RequestId::generate(),
            method,
            url,
            headers: HeaderMap::new(),
        })
    }

    /// Create a GET request.
    pub fn get(url: &str) -> Result<Self, CoreError> {
        Self::new(Method::GET, url)
    }

    /// Build from an `http::Request`, resolving its URI against `origin`
    /// (the adapter's scheme and host).
    pub fn from_http<B>(request: &http::Request<B>, origin: &Url) -> Result<Self, CoreError> {
        let path_and_query = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        let url = origin
            .join(path_and_query)
            .map_err(|source| CoreError::InvalidUrl {
                url: path_and_query.to_string(),
                source,
            })?;

        Ok(Self {
            request_id: RequestId::generate(),
            method: request.method().clone(),
            url,
            headers: request.headers().clone(),
        })
    }

    /// Add a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, CoreError> {
        let name = HeaderName::try_from(name)?;
        let value = HeaderValue::try_from(value)?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Use an existing request ID (e.g. one forwarded by a proxy).
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Request path.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Check whether a query parameter is present, whatever its value.
    pub fn has_query_param(&self, name: &str) -> bool {
        self.url.query_pairs().any(|(key, _)| key == name)
    }

    /// Get the first value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<Cow<'_, str>> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
