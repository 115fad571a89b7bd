//! HTML templating for buffered storefront rendering.
//!
//! The client build emits an `index.html` with four insertion points:
//! the root mount element, the `<head>` block, and the opening `<body`
//! and `<html` tags. This crate provides:
//! - `HtmlTemplate` - The template parsed once into those named slots
//! - `HeadFragments` / `compose_head` - Head markup produced by the renderer
//! - `TemplateSource` - A static template or a per-request provider
//!
//! Fragment and body markup is inserted verbatim. The rendering engine is
//! responsible for escaping; nothing here sanitizes input.

mod error;
mod head;
mod source;
mod template;

pub use error::*;
pub use head::*;
pub use source::*;
pub use template::*;
