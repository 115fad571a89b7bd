//! Head fragment composition.

use serde::{Deserialize, Serialize};

const TITLE_OPEN: &str = "<title>";
const TITLE_CLOSE: &str = "</title>";

/// Category of a head fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadCategory {
    Base,
    Meta,
    Style,
    Noscript,
    Script,
    Link,
}

impl HeadCategory {
    /// Categories in the order they are written into `<head>`.
    pub const ORDERED: [HeadCategory; 6] = [
        Self::Base,
        Self::Meta,
        Self::Style,
        Self::Noscript,
        Self::Script,
        Self::Link,
    ];

    /// Category name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Meta => "meta",
            Self::Style => "style",
            Self::Noscript => "noscript",
            Self::Script => "script",
            Self::Link => "link",
        }
    }
}

/// Pre-rendered head markup returned by the rendering engine.
///
/// Values are inserted as-is; they must already be safe HTML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadFragments {
    /// `<title>` element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noscript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl HeadFragments {
    /// Empty fragments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title element.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the markup for a category.
    pub fn with(mut self, category: HeadCategory, markup: impl Into<String>) -> Self {
        *self.slot_mut(category) = Some(markup.into());
        self
    }

    /// Markup for a category. Empty strings count as absent.
    pub fn get(&self, category: HeadCategory) -> Option<&str> {
        let value = match category {
            HeadCategory::Base => &self.base,
            HeadCategory::Meta => &self.meta,
            HeadCategory::Style => &self.style,
            HeadCategory::Noscript => &self.noscript,
            HeadCategory::Script => &self.script,
            HeadCategory::Link => &self.link,
        };
        non_empty(value)
    }

    /// Title element. An empty string counts as absent.
    pub fn title(&self) -> Option<&str> {
        non_empty(&self.title)
    }

    fn slot_mut(&mut self, category: HeadCategory) -> &mut Option<String> {
        match category {
            HeadCategory::Base => &mut self.base,
            HeadCategory::Meta => &mut self.meta,
            HeadCategory::Style => &mut self.style,
            HeadCategory::Noscript => &mut self.noscript,
            HeadCategory::Script => &mut self.script,
            HeadCategory::Link => &mut self.link,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Build the `<head>…</head>` replacement for a template.
///
/// The category fragments, in [`HeadCategory::ORDERED`] order and joined
/// by newlines, are placed before the template's existing head markup
/// (`existing_inner`). A title fragment replaces the first `<title>`
/// element of the result, or is appended when there is none.
pub fn compose_head(fragments: &HeadFragments, existing_inner: &str) -> String {
    let mut head = HeadCategory::ORDERED
        .iter()
        .filter_map(|category| fragments.get(*category))
        .collect::<Vec<_>>()
        .join("\n");
    head.push_str(existing_inner);

    if let Some(title) = fragments.title() {
        match head.find(TITLE_OPEN) {
            Some(start) => {
                // An unterminated <title> is left alone rather than duplicated.
                if let Some(end) = head[start..].find(TITLE_CLOSE) {
                    let end = start + end + TITLE_CLOSE.len();
                    head.replace_range(start..end, title);
                }
            }
            None => head.push_str(title),
        }
    }

    format!("<head>{}</head>", head)
}
