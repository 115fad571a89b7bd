//! Static asset passthrough.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use storefront_core::{IncomingRequest, RenderContext, ResponseEnvelope};
use tokio::runtime::Handle;
use url::Url;

use crate::error::DispatchError;

/// Extensions served by the asset handler instead of the renderer.
const ASSET_EXTENSIONS: [&str; 9] = ["png", "jpg", "jpeg", "gif", "css", "js", "svg", "ico", "map"];

/// Check if a URL path names a static asset. Case-insensitive; the path
/// must end with `.` and a known extension.
pub fn is_asset_path(path: &str) -> bool {
    let Some((_, extension)) = path.rsplit_once('.') else {
        return false;
    };
    ASSET_EXTENSIONS
        .iter()
        .any(|known| extension.eq_ignore_ascii_case(known))
}

/// Hook for scheduling work that may outlive the response.
pub type WaitUntil = Arc<dyn Fn(BoxFuture<'static, ()>) + Send + Sync>;

/// Per-request event handed to the asset handler.
#[derive(Clone)]
pub struct FetchEvent<'a> {
    request: &'a IncomingRequest,
    context: &'a RenderContext,
    wait_until: Option<WaitUntil>,
}

impl<'a> FetchEvent<'a> {
    /// Create an event for a request.
    pub fn new(request: &'a IncomingRequest, context: &'a RenderContext) -> Self {
        Self {
            request,
            context,
            wait_until: None,
        }
    }

    /// Use a host-provided hook for background work.
    pub fn with_wait_until(mut self, hook: Option<WaitUntil>) -> Self {
        self.wait_until = hook;
        self
    }

    /// The request.
    pub fn request(&self) -> &'a IncomingRequest {
        self.request
    }

    /// Render context for this dispatch.
    pub fn context(&self) -> &'a RenderContext {
        self.context
    }

    /// Run `work` in the background. Without a host hook it is spawned on
    /// the current tokio runtime; outside a runtime the work is dropped and
    /// a warning is logged.
    pub fn wait_until<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(hook) = &self.wait_until {
            hook(Box::pin(work));
            return;
        }

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(work);
            }
            Err(e) => tracing::warn!(
                target: storefront_observability::LOG_TARGET,
                request_id = %self.context.request_id(),
                url = %self.request.url,
                "background work dropped, no runtime: {}",
                e
            ),
        }
    }
}

impl fmt::Debug for FetchEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchEvent")
            .field("url", &self.request.url.as_str())
            .field("context", &self.context)
            .field("wait_until", &self.wait_until.is_some())
            .finish()
    }
}

/// Serves static assets.
#[async_trait]
pub trait AssetHandler: Send + Sync {
    /// Produce the response for an asset URL.
    async fn handle(&self, event: &FetchEvent<'_>, url: &Url) -> anyhow::Result<ResponseEnvelope>;
}

/// Result of asset routing.
#[derive(Debug)]
pub enum AssetRoute {
    /// The handler produced the response.
    Served(ResponseEnvelope),
    /// Asset path, but no handler is configured.
    Unhandled,
    /// Not an asset path.
    NotAsset,
}

/// Routes asset requests to the configured handler.
#[derive(Clone, Default)]
pub struct AssetRouter {
    handler: Option<Arc<dyn AssetHandler>>,
}

impl AssetRouter {
    /// Create a router.
    pub fn new(handler: Option<Arc<dyn AssetHandler>>) -> Self {
        Self { handler }
    }

    /// Check if a handler is configured.
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Route a request. Handler errors are returned unchanged.
    pub async fn route(&self, event: &FetchEvent<'_>, url: &Url) -> Result<AssetRoute, DispatchError> {
        if !is_asset_path(url.path()) {
            return Ok(AssetRoute::NotAsset);
        }

        match &self.handler {
            Some(handler) => handler
                .handle(event, url)
                .await
                .map(AssetRoute::Served)
                .map_err(DispatchError::Asset),
            None => Ok(AssetRoute::Unhandled),
        }
    }
}

impl fmt::Debug for AssetRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetRouter")
            .field("handler", &self.has_handler())
            .finish()
    }
}
