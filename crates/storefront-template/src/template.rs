//! HTML template slot model.

use std::ops::Range;

use crate::head::{compose_head, HeadFragments};

/// Root mount element emitted by the client build.
pub const ROOT_MOUNT: &str = r#"<div id="root"></div>"#;

/// Attribute marking the root as server-rendered for the client runtime.
pub const SERVER_RENDERED_ATTR: &str = r#"data-server-rendered="true""#;

const HEAD_OPEN: &str = "<head>";
const HEAD_CLOSE: &str = "</head>";
const BODY_OPEN: &str = "<body";
const HTML_OPEN: &str = "<html";

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeadSlot {
    outer: Range<usize>,
    inner: Range<usize>,
}

/// Which insertion points a template provides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateSlots {
    /// `<div id="root"></div>` was found.
    pub root_mount: bool,
    /// A `<head>…</head>` block was found.
    pub head: bool,
    /// An opening `<body` tag was found.
    pub body: bool,
    /// An opening `<html` tag was found.
    pub html: bool,
}

/// Rendered values to place into a template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateFill<'a> {
    /// Markup for the root mount.
    pub body: &'a str,
    /// Head fragments.
    pub head: &'a HeadFragments,
    /// Attributes for the opening `<body` tag.
    pub body_attributes: Option<&'a str>,
    /// Attributes for the opening `<html` tag.
    pub html_attributes: Option<&'a str>,
}

/// An HTML template parsed once into its insertion points.
///
/// Each slot is the first occurrence of its marker in the original
/// template. Filling splices values in by position, so markup in one
/// value can never be mistaken for a marker of another slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlTemplate {
    source: String,
    root_mount: Option<Range<usize>>,
    head: Option<HeadSlot>,
    body_tag: Option<usize>,
    html_tag: Option<usize>,
}

/// One splice into the template source.
struct Edit<'a> {
    range: Range<usize>,
    replacement: Replacement<'a>,
}

enum Replacement<'a> {
    Root(&'a str),
    Head,
    Attributes(&'a str),
}

impl HtmlTemplate {
    /// Parse a template.
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();

        let root_mount = source
            .find(ROOT_MOUNT)
            .map(|start| start..start + ROOT_MOUNT.len());

        let head = source.find(HEAD_OPEN).and_then(|start| {
            let inner_start = start + HEAD_OPEN.len();
            source[inner_start..].find(HEAD_CLOSE).map(|offset| {
                let inner_end = inner_start + offset;
                HeadSlot {
                    outer: start..inner_end + HEAD_CLOSE.len(),
                    inner: inner_start..inner_end,
                }
            })
        });

        // Markup inside the head block (inline scripts) can mention `<body`.
        let body_from = head.as_ref().map_or(0, |slot| slot.outer.end);
        let body_tag = source[body_from..]
            .find(BODY_OPEN)
            .map(|offset| body_from + offset + BODY_OPEN.len());
        let html_tag = source.find(HTML_OPEN).map(|start| start + HTML_OPEN.len());

        Self {
            source,
            root_mount,
            head,
            body_tag,
            html_tag,
        }
    }

    /// Original template text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Insertion points found while parsing.
    pub fn slots(&self) -> TemplateSlots {
        TemplateSlots {
            root_mount: self.root_mount.is_some(),
            head: self.head.is_some(),
            body: self.body_tag.is_some(),
            html: self.html_tag.is_some(),
        }
    }

    /// Markup currently inside the template's `<head>` block.
    pub fn head_inner(&self) -> Option<&str> {
        self.head
            .as_ref()
            .map(|slot| &self.source[slot.inner.clone()])
    }

    /// Produce the full document.
    ///
    /// Slots missing from the template are skipped; absent attributes leave
    /// their tag untouched.
    pub fn render(&self, fill: &TemplateFill<'_>) -> String {
        let mut edits = Vec::with_capacity(4);

        if let Some(range) = &self.root_mount {
            edits.push(Edit {
                range: range.clone(),
                replacement: Replacement::Root(fill.body),
            });
        }
        if let Some(slot) = &self.head {
            edits.push(Edit {
                range: slot.outer.clone(),
                replacement: Replacement::Head,
            });
        }
        if let (Some(at), Some(attrs)) = (self.body_tag, fill.body_attributes) {
            edits.push(Edit {
                range: at..at,
                replacement: Replacement::Attributes(attrs),
            });
        }
        if let (Some(at), Some(attrs)) = (self.html_tag, fill.html_attributes) {
            edits.push(Edit {
                range: at..at,
                replacement: Replacement::Attributes(attrs),
            });
        }

        edits.sort_by_key(|edit| edit.range.start);

        let mut out = String::with_capacity(self.source.len() + fill.body.len() + 256);
        let mut cursor = 0;

        for edit in edits {
            // Overlapping markers only occur in malformed templates; the
            // earlier slot wins.
            if edit.range.start < cursor {
                continue;
            }
            out.push_str(&self.source[cursor..edit.range.start]);

            match edit.replacement {
                Replacement::Root(body) => {
                    out.push_str(r#"<div id="root" "#);
                    out.push_str(SERVER_RENDERED_ATTR);
                    out.push('>');
                    out.push_str(body);
                    out.push_str("</div>");
                }
                Replacement::Head => {
                    out.push_str(&compose_head(fill.head, self.head_inner().unwrap_or("")));
                }
                Replacement::Attributes(attrs) => {
                    out.push(' ');
                    out.push_str(attrs);
                }
            }

            cursor = edit.range.end;
        }

        out.push_str(&self.source[cursor..]);
        out
    }
}
