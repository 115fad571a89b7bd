//! Rendering engine capabilities.
//!
//! A server entrypoint exposes up to three capabilities. [`EntrypointModule`]
//! is the loadable form, where any of them may be missing; [`Entrypoint`] is
//! the validated form a dispatcher is built from.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use storefront_core::{ComponentResponse, IncomingRequest, RenderContext};
use storefront_streaming::ResponseSink;
use storefront_template::{HeadFragments, HtmlTemplate};
use url::Url;

use crate::error::ConfigError;

/// Work started by a streaming capability.
///
/// It owns the sink and runs until the engine closes it.
pub type StreamTask = BoxFuture<'static, anyhow::Result<()>>;

/// Options passed to [`Render::render`].
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    /// The request being rendered.
    pub request: &'a IncomingRequest,
    /// Render context for this dispatch.
    pub context: &'a RenderContext,
    /// The request path is the hydration probe path.
    pub is_hydration_request: bool,
    /// Development mode.
    pub dev: bool,
}

/// Options passed to [`Hydrate::hydrate`].
#[derive(Debug)]
pub struct HydrateOptions {
    pub context: RenderContext,
    pub request: IncomingRequest,
    /// Live sink; the engine writes the head and chunks, then closes it.
    pub sink: ResponseSink,
    pub dev: bool,
}

/// Options passed to [`Stream::stream`].
#[derive(Debug)]
pub struct StreamOptions {
    pub context: RenderContext,
    pub request: IncomingRequest,
    /// Live sink; the engine writes the head and chunks, then closes it.
    pub sink: ResponseSink,
    /// Template resolved for this request.
    pub template: Arc<HtmlTemplate>,
    pub dev: bool,
}

/// Result of a buffered render.
#[derive(Debug, Clone, Default)]
pub struct RenderOutput {
    /// Rendered markup for the root mount.
    pub body: String,
    /// Head fragments collected while rendering.
    pub head: HeadFragments,
    /// Attributes for the opening `<body` tag.
    pub body_attributes: Option<String>,
    /// Attributes for the opening `<html` tag.
    pub html_attributes: Option<String>,
    /// Status, headers, caching and custom body set by components.
    pub component_response: ComponentResponse,
}

impl RenderOutput {
    /// Output with the given body and nothing else.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    /// Set head fragments.
    pub fn with_head(mut self, head: HeadFragments) -> Self {
        self.head = head;
        self
    }

    /// Set body tag attributes.
    pub fn with_body_attributes(mut self, attributes: impl Into<String>) -> Self {
        self.body_attributes = Some(attributes.into());
        self
    }

    /// Set html tag attributes.
    pub fn with_html_attributes(mut self, attributes: impl Into<String>) -> Self {
        self.html_attributes = Some(attributes.into());
        self
    }

    /// Set the component response.
    pub fn with_component_response(mut self, response: ComponentResponse) -> Self {
        self.component_response = response;
        self
    }
}

/// Buffered render capability.
#[async_trait]
pub trait Render: Send + Sync {
    /// Render the page for `url` to a string.
    async fn render(&self, url: &Url, options: RenderOptions<'_>) -> anyhow::Result<RenderOutput>;
}

/// Streaming hydration capability.
pub trait Hydrate: Send + Sync {
    /// Start streaming hydration data for `url` into the sink.
    fn hydrate(&self, url: Url, options: HydrateOptions) -> StreamTask;
}

/// Streaming full-page capability.
pub trait Stream: Send + Sync {
    /// Start streaming the full page for `url` into the sink.
    fn stream(&self, url: Url, options: StreamOptions) -> StreamTask;
}

/// A capability of a server entrypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Render,
    Hydrate,
    Stream,
}

impl Capability {
    /// Capability name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Render => "render",
            Self::Hydrate => "hydrate",
            Self::Stream => "stream",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entrypoint as loaded, before validation.
#[derive(Clone, Default)]
pub struct EntrypointModule {
    render: Option<Arc<dyn Render>>,
    hydrate: Option<Arc<dyn Hydrate>>,
    stream: Option<Arc<dyn Stream>>,
}

impl EntrypointModule {
    /// Empty module.
    pub fn new() -> Self {
        Self::default()
    }

    /// Module whose three capabilities are all provided by one engine.
    pub fn from_engine<E>(engine: Arc<E>) -> Self
    where
        E: Render + Hydrate + Stream + 'static,
    {
        Self {
            render: Some(engine.clone()),
            hydrate: Some(engine.clone()),
            stream: Some(engine),
        }
    }

    /// Set the render capability.
    pub fn with_render(mut self, render: impl Render + 'static) -> Self {
        self.render = Some(Arc::new(render));
        self
    }

    /// Set the hydrate capability.
    pub fn with_hydrate(mut self, hydrate: impl Hydrate + 'static) -> Self {
        self.hydrate = Some(Arc::new(hydrate));
        self
    }

    /// Set the stream capability.
    pub fn with_stream(mut self, stream: impl Stream + 'static) -> Self {
        self.stream = Some(Arc::new(stream));
        self
    }

    /// Capabilities not provided, in `render`, `hydrate`, `stream` order.
    pub fn missing(&self) -> Vec<Capability> {
        let mut missing = Vec::new();
        if self.render.is_none() {
            missing.push(Capability::Render);
        }
        if self.hydrate.is_none() {
            missing.push(Capability::Hydrate);
        }
        if self.stream.is_none() {
            missing.push(Capability::Stream);
        }
        missing
    }

    /// Check that every capability is present.
    pub fn validate(self) -> Result<Entrypoint, ConfigError> {
        match (self.render, self.hydrate, self.stream) {
            (Some(render), Some(hydrate), Some(stream)) => Ok(Entrypoint {
                render,
                hydrate,
                stream,
            }),
            (render, hydrate, stream) => {
                let missing = [
                    (render.is_none(), Capability::Render),
                    (hydrate.is_none(), Capability::Hydrate),
                    (stream.is_none(), Capability::Stream),
                ]
                .into_iter()
                .filter_map(|(absent, capability)| absent.then_some(capability))
                .collect();
                Err(ConfigError::MissingCapabilities { missing })
            }
        }
    }
}

impl fmt::Debug for EntrypointModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntrypointModule")
            .field("missing", &self.missing())
            .finish()
    }
}

/// Validated entrypoint with all three capabilities.
#[derive(Clone)]
pub struct Entrypoint {
    render: Arc<dyn Render>,
    hydrate: Arc<dyn Hydrate>,
    stream: Arc<dyn Stream>,
}

impl Entrypoint {
    /// Render capability.
    pub fn render(&self) -> &dyn Render {
        self.render.as_ref()
    }

    /// Hydrate capability.
    pub fn hydrate(&self) -> &dyn Hydrate {
        self.hydrate.as_ref()
    }

    /// Stream capability.
    pub fn stream(&self) -> &dyn Stream {
        self.stream.as_ref()
    }
}

impl fmt::Debug for Entrypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Entrypoint(render, hydrate, stream)")
    }
}
