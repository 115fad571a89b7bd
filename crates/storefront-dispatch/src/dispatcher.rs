//! Per-request dispatch.

use std::fmt;
use std::sync::Arc;

use storefront_core::{
    CacheHandle, ContextValue, DispatchPhase, IncomingRequest, LifecycleObserver, RenderConfig,
    RenderContext, ResponseEnvelope, TimingContext,
};
use storefront_observability::{LogFormat, LogLevel, StructuredLogger};
use storefront_streaming::ResponseSink;
use storefront_template::TemplateSource;

use crate::asset::{AssetHandler, AssetRoute, AssetRouter, FetchEvent, WaitUntil};
use crate::buffered::assemble;
use crate::entrypoint::{Entrypoint, EntrypointModule};
use crate::error::{ConfigError, DispatchError};
use crate::mode::{select_mode, RenderMode};
use crate::streaming::{invoke_hydrate, invoke_stream, StreamingHandoff};

/// What a dispatch produced.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A complete response for the server adapter to send.
    Response(ResponseEnvelope),
    /// The sink was handed to the engine, which completes the response.
    Delegated(StreamingHandoff),
}

impl DispatchOutcome {
    /// Check if the engine owns the response.
    pub fn is_delegated(&self) -> bool {
        matches!(self, Self::Delegated(_))
    }

    /// The response, if one was produced.
    pub fn into_response(self) -> Option<ResponseEnvelope> {
        match self {
            Self::Response(response) => Some(response),
            Self::Delegated(_) => None,
        }
    }

    /// The streaming handoff, if the sink was delegated.
    pub fn into_handoff(self) -> Option<StreamingHandoff> {
        match self {
            Self::Response(_) => None,
            Self::Delegated(handoff) => Some(handoff),
        }
    }
}

/// Per-request inputs supplied by the server adapter.
#[derive(Default)]
pub struct DispatchInput {
    sink: Option<ResponseSink>,
    context: ContextValue,
    wait_until: Option<WaitUntil>,
}

impl DispatchInput {
    /// No sink, no context value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide a live sink, enabling the streaming modes.
    pub fn with_sink(mut self, sink: ResponseSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Provide the host's context value.
    pub fn with_context(mut self, context: ContextValue) -> Self {
        self.context = context;
        self
    }

    /// Provide the host's hook for background work.
    pub fn with_wait_until(mut self, hook: WaitUntil) -> Self {
        self.wait_until = Some(hook);
        self
    }
}

impl fmt::Debug for DispatchInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchInput")
            .field("sink", &self.sink)
            .field("context", &self.context)
            .field("wait_until", &self.wait_until.is_some())
            .finish()
    }
}

/// Builder for a [`Dispatcher`].
///
/// # Example
///
/// ```rust,ignore
/// let dispatcher = DispatcherBuilder::new(EntrypointModule::from_engine(engine))
///     .with_template(TemplateSource::from_file("dist/client/index.html")?)
///     .with_asset_handler(StaticFiles::new("dist/client"))
///     .with_config(RenderConfig::production())
///     .build()?;
/// ```
pub struct DispatcherBuilder {
    entrypoint: EntrypointModule,
    templates: Option<TemplateSource>,
    asset_handler: Option<Arc<dyn AssetHandler>>,
    cache: Option<CacheHandle>,
    config: RenderConfig,
    observer: Option<Arc<dyn LifecycleObserver>>,
    log_format: LogFormat,
    log_level: LogLevel,
}

impl DispatcherBuilder {
    /// Start from a loaded entrypoint module.
    pub fn new(entrypoint: EntrypointModule) -> Self {
        Self {
            entrypoint,
            templates: None,
            asset_handler: None,
            cache: None,
            config: RenderConfig::default(),
            observer: None,
            log_format: LogFormat::default(),
            log_level: LogLevel::Info,
        }
    }

    /// Set the template source.
    pub fn with_template(mut self, templates: TemplateSource) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Set the asset handler.
    pub fn with_asset_handler(mut self, handler: impl AssetHandler + 'static) -> Self {
        self.asset_handler = Some(Arc::new(handler));
        self
    }

    /// Set the cache handle passed to every render context.
    pub fn with_cache(mut self, cache: CacheHandle) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the render configuration.
    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    /// Set a lifecycle observer.
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Set log output format.
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Set minimum log level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Validate the entrypoint and build the dispatcher.
    pub fn build(self) -> Result<Dispatcher, ConfigError> {
        let entrypoint = self.entrypoint.validate()?;
        let templates = self.templates.ok_or(ConfigError::MissingTemplate)?;

        Ok(Dispatcher {
            entrypoint,
            templates,
            assets: AssetRouter::new(self.asset_handler),
            cache: self.cache,
            config: self.config,
            observer: self.observer,
            log_format: self.log_format,
            log_level: self.log_level,
        })
    }
}

/// Turns one request into a response or a streaming handoff.
///
/// Holds only configuration; every dispatch builds its own
/// [`RenderContext`], so one dispatcher can serve concurrent requests.
pub struct Dispatcher {
    entrypoint: Entrypoint,
    templates: TemplateSource,
    assets: AssetRouter,
    cache: Option<CacheHandle>,
    config: RenderConfig,
    observer: Option<Arc<dyn LifecycleObserver>>,
    log_format: LogFormat,
    log_level: LogLevel,
}

impl Dispatcher {
    /// Start building a dispatcher.
    pub fn builder(entrypoint: EntrypointModule) -> DispatcherBuilder {
        DispatcherBuilder::new(entrypoint)
    }

    /// Render configuration.
    pub fn config(&self) -> RenderConfig {
        self.config
    }

    /// Template source.
    pub fn templates(&self) -> &TemplateSource {
        &self.templates
    }

    /// Dispatch one request.
    pub async fn dispatch(
        &self,
        request: &IncomingRequest,
        input: DispatchInput,
    ) -> Result<DispatchOutcome, DispatchError> {
        let DispatchInput {
            sink,
            context,
            wait_until,
        } = input;

        let timing = TimingContext::new();
        let context = RenderContext::initialize(
            request.request_id.clone(),
            self.cache.clone(),
            context,
            self.config,
        );
        let logger = StructuredLogger::new(request.request_id.clone())
            .with_route(request.path())
            .with_format(self.log_format)
            .with_min_level(self.log_level);

        logger
            .debug_builder("dispatch started")
            .field("method", request.method.as_str())
            .field_bool("sink", sink.is_some())
            .field_bool("dev", context.is_dev())
            .emit();
        self.notify(DispatchPhase::Start, &timing);

        let result = self
            .run(request, context, sink, wait_until, &logger, &timing)
            .await;

        if let Err(e) = &result {
            logger
                .error_builder("dispatch failed")
                .field("error", format!("{:#}", e))
                .duration_ms("elapsed_ms", timing.elapsed())
                .emit();
            self.notify(DispatchPhase::Error(e.to_string()), &timing);
        }

        result
    }

    async fn run(
        &self,
        request: &IncomingRequest,
        context: RenderContext,
        sink: Option<ResponseSink>,
        wait_until: Option<WaitUntil>,
        logger: &StructuredLogger,
        timing: &TimingContext,
    ) -> Result<DispatchOutcome, DispatchError> {
        let route = {
            let event = FetchEvent::new(request, &context).with_wait_until(wait_until);
            self.assets.route(&event, &request.url).await?
        };
        match route {
            AssetRoute::Served(response) => {
                logger
                    .debug_builder("asset served")
                    .field_u64("status", u64::from(response.status.as_u16()))
                    .emit();
                self.notify(DispatchPhase::AssetServed, timing);
                return Ok(DispatchOutcome::Response(response));
            }
            AssetRoute::Unhandled => logger.debug("asset path without asset handler, rendering"),
            AssetRoute::NotAsset => {}
        }

        let mode = select_mode(&request.url, sink.is_some());
        logger
            .debug_builder("render mode selected")
            .field("mode", mode.as_str())
            .emit();

        let outcome = match (mode, sink) {
            (RenderMode::StreamingHydration, Some(sink)) => {
                DispatchOutcome::Delegated(invoke_hydrate(&self.entrypoint, request, context, sink))
            }
            (RenderMode::StreamingFull, Some(sink)) => DispatchOutcome::Delegated(
                invoke_stream(&self.entrypoint, &self.templates, request, context, sink).await?,
            ),
            _ => DispatchOutcome::Response(
                assemble(&self.entrypoint, &self.templates, request, &context).await?,
            ),
        };

        match &outcome {
            DispatchOutcome::Response(response) => {
                logger
                    .info_builder("page rendered")
                    .field("mode", mode.as_str())
                    .field_u64("status", u64::from(response.status.as_u16()))
                    .field_u64("bytes", response.body.len() as u64)
                    .duration_ms("elapsed_ms", timing.elapsed())
                    .emit();
                self.notify(DispatchPhase::Rendered, timing);
            }
            DispatchOutcome::Delegated(handoff) => {
                logger
                    .info_builder("sink delegated")
                    .field("mode", handoff.mode().as_str())
                    .duration_ms("elapsed_ms", timing.elapsed())
                    .emit();
                self.notify(DispatchPhase::Delegated, timing);
            }
        }

        Ok(outcome)
    }

    fn notify(&self, phase: DispatchPhase, timing: &TimingContext) {
        if let Some(observer) = &self.observer {
            observer.on_phase(phase, timing.elapsed());
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("templates", &self.templates)
            .field("assets", &self.assets)
            .field("cache", &self.cache.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
