//! Cache header naming.

use http::HeaderName;

/// Header names used by the dispatcher.
pub mod header_names {
    /// Cache-Control header served in production.
    pub const CACHE_CONTROL: &str = "cache-control";
    /// Cache-Control header served in development, so local responses
    /// never populate shared caches.
    pub const CACHE_CONTROL_PREVIEW: &str = "cache-control-preview";
}

/// Header that carries the cache-control directive for the environment.
pub fn cache_control_header_name(dev: bool) -> HeaderName {
    if dev {
        HeaderName::from_static(header_names::CACHE_CONTROL_PREVIEW)
    } else {
        http::header::CACHE_CONTROL
    }
}
