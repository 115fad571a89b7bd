//! Caching strategies for rendered responses.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const SECOND: u64 = 1;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Cache mode determining who can cache the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    /// Cacheable by CDN and browser (shared cache).
    #[default]
    Public,
    /// Cacheable by browser only (private cache).
    Private,
    /// No caching.
    NoStore,
}

impl CacheMode {
    /// Get the Cache-Control directive for this mode.
    pub fn cache_control_directive(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::NoStore => "no-store",
        }
    }

    /// Check if this mode allows any caching.
    pub fn allows_caching(&self) -> bool {
        !matches!(self, Self::NoStore)
    }
}

/// Cache-control policy attached to a component response.
///
/// The presets mirror the durations storefronts commonly pick per page
/// type; `custom` starts from an empty policy in the given mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachingStrategy {
    /// Cache mode.
    pub mode: CacheMode,
    /// Freshness lifetime.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<Duration>,
    /// Shared-cache freshness lifetime.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s_max_age: Option<Duration>,
    /// Stale-while-revalidate window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_while_revalidate: Option<Duration>,
    /// Stale-if-error window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_if_error: Option<Duration>,
    /// Require revalidation once stale.
    #[serde(default)]
    pub must_revalidate: bool,
}

impl Default for CachingStrategy {
    fn default() -> Self {
        Self::seconds()
    }
}

impl CachingStrategy {
    fn preset(max_age: u64, swr: u64) -> Self {
        Self {
            mode: CacheMode::Public,
            max_age: Some(Duration::from_secs(max_age)),
            s_max_age: None,
            stale_while_revalidate: Some(Duration::from_secs(swr)),
            stale_if_error: None,
            must_revalidate: false,
        }
    }

    /// One second fresh, nine seconds stale-while-revalidate.
    pub fn seconds() -> Self {
        Self::preset(SECOND, 9 * SECOND)
    }

    /// Fifteen minutes fresh, fifteen minutes stale-while-revalidate.
    pub fn minutes() -> Self {
        Self::preset(15 * MINUTE, 15 * MINUTE)
    }

    /// Thirty minutes fresh, thirty minutes stale-while-revalidate.
    pub fn hours() -> Self {
        Self::preset(30 * MINUTE, 30 * MINUTE)
    }

    /// One hour fresh, twenty-three hours stale-while-revalidate.
    pub fn days() -> Self {
        Self::preset(HOUR, 23 * HOUR)
    }

    /// Fifteen days fresh, fifteen days stale-while-revalidate.
    pub fn months() -> Self {
        Self::preset(15 * DAY, 15 * DAY)
    }

    /// Disable caching entirely.
    pub fn no_store() -> Self {
        Self::custom(CacheMode::NoStore)
    }

    /// Start an empty policy in the given mode.
    pub fn custom(mode: CacheMode) -> Self {
        Self {
            mode,
            max_age: None,
            s_max_age: None,
            stale_while_revalidate: None,
            stale_if_error: None,
            must_revalidate: false,
        }
    }

    /// Make the policy private (browser cache only).
    pub fn private(mut self) -> Self {
        self.mode = CacheMode::Private;
        self
    }

    /// Set max-age.
    pub fn with_max_age(mut self, duration: Duration) -> Self {
        self.max_age = Some(duration);
        self
    }

    /// Set s-maxage.
    pub fn with_s_max_age(mut self, duration: Duration) -> Self {
        self.s_max_age = Some(duration);
        self
    }

    /// Set stale-while-revalidate window.
    pub fn with_swr(mut self, duration: Duration) -> Self {
        self.stale_while_revalidate = Some(duration);
        self
    }

    /// Set stale-if-error window.
    pub fn with_stale_if_error(mut self, duration: Duration) -> Self {
        self.stale_if_error = Some(duration);
        self
    }

    /// Require revalidation once stale.
    pub fn must_revalidate(mut self) -> Self {
        self.must_revalidate = true;
        self
    }

    /// How long a store may keep an entry: max-age plus the
    /// stale-while-revalidate window, saturating at `Duration::MAX`.
    /// `None` means not storable.
    pub fn storable_for(&self) -> Option<Duration> {
        if !self.mode.allows_caching() {
            return None;
        }
        let fresh = self.max_age?;
        Some(fresh.saturating_add(self.stale_while_revalidate.unwrap_or_default()))
    }

    /// Generate Cache-Control header value.
    pub fn cache_control_header(&self) -> String {
        if !self.mode.allows_caching() {
            return CacheMode::NoStore.cache_control_directive().to_string();
        }

        let mut parts = vec![self.mode.cache_control_directive().to_string()];

        if let Some(max_age) = self.max_age {
            parts.push(format!("max-age={}", max_age.as_secs()));
        }

        if let Some(s_max_age) = self.s_max_age {
            parts.push(format!("s-maxage={}", s_max_age.as_secs()));
        }

        if self.must_revalidate {
            parts.push("must-revalidate".to_string());
        }

        if let Some(swr) = self.stale_while_revalidate {
            parts.push(format!("stale-while-revalidate={}", swr.as_secs()));
        }

        if let Some(sie) = self.stale_if_error {
            parts.push(format!("stale-if-error={}", sie.as_secs()));
        }

        parts.join(", ")
    }
}
