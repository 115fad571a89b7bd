//! Render mode selection.

use std::fmt;

use url::Url;

/// Path the client runtime requests hydration data from.
pub const HYDRATION_PATH: &str = "/react";

/// Query parameter that forces a buffered render. Only its presence
/// matters.
pub const BOT_QUERY_PARAM: &str = "_bot";

/// How a non-asset request is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Hydration data streamed into the sink.
    StreamingHydration,
    /// Full page streamed into the sink.
    StreamingFull,
    /// Full page rendered to a string and returned.
    BufferedFull,
}

impl RenderMode {
    /// Mode name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StreamingHydration => "streaming-hydration",
            Self::StreamingFull => "streaming-full",
            Self::BufferedFull => "buffered-full",
        }
    }

    /// Check if the mode hands the sink to the engine.
    pub fn is_streaming(&self) -> bool {
        !matches!(self, Self::BufferedFull)
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check if a request may be streamed.
///
/// Crawlers are flagged with the `_bot` query parameter and always get a
/// buffered page with a complete head. The user agent is not inspected.
pub fn is_streamable_request(url: &Url) -> bool {
    !url.query_pairs().any(|(name, _)| name == BOT_QUERY_PARAM)
}

/// Check if the request path is the hydration probe path.
pub fn is_hydration_request(url: &Url) -> bool {
    url.path() == HYDRATION_PATH
}

/// Pick the render mode for a request that was not served as an asset.
pub fn select_mode(url: &Url, sink_available: bool) -> RenderMode {
    if !sink_available || !is_streamable_request(url) {
        return RenderMode::BufferedFull;
    }

    if is_hydration_request(url) {
        RenderMode::StreamingHydration
    } else {
        RenderMode::StreamingFull
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    // === Streamable Tests ===

    #[test]
    fn test_bot_param_presence() {
        assert!(is_streamable_request(&url("https://shop.example/")));
        assert!(!is_streamable_request(&url("https://shop.example/?_bot")));
        assert!(!is_streamable_request(&url("https://shop.example/?_bot=")));
        assert!(!is_streamable_request(&url("https://shop.example/p?a=1&_bot=0")));
        assert!(is_streamable_request(&url("https://shop.example/p?bot=1")));
    }

    #[test]
    fn test_bot_param_in_path_is_ignored() {
        assert!(is_streamable_request(&url("https://shop.example/_bot")));
    }

    // === Hydration Path Tests ===

    #[test]
    fn test_hydration_path_exact() {
        assert!(is_hydration_request(&url("https://shop.example/react")));
        assert!(is_hydration_request(&url("https://shop.example/react?state=1")));
        assert!(!is_hydration_request(&url("https://shop.example/react/")));
        assert!(!is_hydration_request(&url("https://shop.example/reactive")));
        assert!(!is_hydration_request(&url("https://shop.example/app/react")));
    }

    // === Selection Tests ===

    #[test]
    fn test_select_with_sink() {
        assert_eq!(
            select_mode(&url("https://shop.example/react"), true),
            RenderMode::StreamingHydration
        );
        assert_eq!(
            select_mode(&url("https://shop.example/products/1"), true),
            RenderMode::StreamingFull
        );
    }

    #[test]
    fn test_select_without_sink() {
        assert_eq!(
            select_mode(&url("https://shop.example/react"), false),
            RenderMode::BufferedFull
        );
        assert_eq!(
            select_mode(&url("https://shop.example/"), false),
            RenderMode::BufferedFull
        );
    }

    #[test]
    fn test_select_bot_never_streams() {
        assert_eq!(
            select_mode(&url("https://shop.example/?_bot=1"), true),
            RenderMode::BufferedFull
        );
        assert_eq!(
            select_mode(&url("https://shop.example/react?_bot"), true),
            RenderMode::BufferedFull
        );
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(RenderMode::StreamingFull.to_string(), "streaming-full");
        assert!(RenderMode::StreamingHydration.is_streaming());
        assert!(!RenderMode::BufferedFull.is_streaming());
    }
}
