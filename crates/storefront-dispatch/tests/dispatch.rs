//! End-to-end dispatch tests with a recording engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use http::{HeaderValue, StatusCode};
use storefront_cache::{CachingStrategy, InMemoryCacheStore};
use storefront_core::{
    ComponentResponse, ContextValue, DispatchPhase, IncomingRequest, LifecycleObserver,
    RenderConfig, ResponseEnvelope,
};
use storefront_dispatch::{
    AssetHandler, DispatchError, DispatchInput, DispatchOutcome, Dispatcher, EntrypointModule,
    FetchEvent, Hydrate, HydrateOptions, Render, RenderMode, RenderOptions, RenderOutput, Stream,
    StreamOptions, StreamTask,
};
use storefront_streaming::{ResponseHead, ResponseSink};
use storefront_template::{HeadCategory, HeadFragments, TemplateError, TemplateSource};
use url::Url;

const INDEX: &str = "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>Old</title></head><body><div id=\"root\"></div><script type=\"module\" src=\"/client.js\"></script></body></html>";

const BARE_INDEX: &str = "<html><head><meta charset=\"utf-8\"></head><body><div id=\"root\"></div></body></html>";

type RenderFn = dyn Fn(&Url, RenderOptions<'_>) -> anyhow::Result<RenderOutput> + Send + Sync;

/// Engine that records every capability call.
struct FakeEngine {
    render_fn: Box<RenderFn>,
    render_calls: AtomicUsize,
    hydrate_calls: AtomicUsize,
    stream_calls: AtomicUsize,
    streamed_templates: Mutex<Vec<String>>,
}

impl FakeEngine {
    fn rendering<F>(render_fn: F) -> Arc<Self>
    where
        F: Fn(&Url, RenderOptions<'_>) -> anyhow::Result<RenderOutput> + Send + Sync + 'static,
    {
        Arc::new(Self {
            render_fn: Box::new(render_fn),
            render_calls: AtomicUsize::new(0),
            hydrate_calls: AtomicUsize::new(0),
            stream_calls: AtomicUsize::new(0),
            streamed_templates: Mutex::new(Vec::new()),
        })
    }

    fn returning(output: RenderOutput) -> Arc<Self> {
        Self::rendering(move |_url, _options| Ok(output.clone()))
    }

    fn calls(&self) -> (usize, usize, usize) {
        (
            self.render_calls.load(Ordering::SeqCst),
            self.hydrate_calls.load(Ordering::SeqCst),
            self.stream_calls.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl Render for FakeEngine {
    async fn render(&self, url: &Url, options: RenderOptions<'_>) -> anyhow::Result<RenderOutput> {
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        (self.render_fn)(url, options)
    }
}

impl Hydrate for FakeEngine {
    fn hydrate(&self, url: Url, options: HydrateOptions) -> StreamTask {
        self.hydrate_calls.fetch_add(1, Ordering::SeqCst);
        let HydrateOptions { mut sink, dev, .. } = options;
        Box::pin(async move {
            sink.write(format!("hydrate:{}:{}", url.path(), dev)).await?;
            sink.close().await?;
            Ok(())
        })
    }
}

impl Stream for FakeEngine {
    fn stream(&self, url: Url, options: StreamOptions) -> StreamTask {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut templates) = self.streamed_templates.lock() {
            templates.push(options.template.as_str().to_string());
        }
        let StreamOptions { mut sink, .. } = options;
        Box::pin(async move {
            let mut head = ResponseHead::new(StatusCode::OK);
            head.headers
                .insert("content-type", HeaderValue::from_static("text/html"));
            sink.write_head(head)?;
            sink.write(format!("<p>stream {}</p>", url.path())).await?;
            sink.close().await?;
            Ok(())
        })
    }
}

struct StaticFiles;

#[async_trait]
impl AssetHandler for StaticFiles {
    async fn handle(&self, _event: &FetchEvent<'_>, url: &Url) -> anyhow::Result<ResponseEnvelope> {
        let mut response = ResponseEnvelope::ok(format!("asset {}", url.path()));
        response
            .headers
            .insert("content-type", HeaderValue::from_static("image/png"));
        Ok(response)
    }
}

#[derive(Default)]
struct Phases(Mutex<Vec<DispatchPhase>>);

impl LifecycleObserver for Phases {
    fn on_phase(&self, phase: DispatchPhase, _elapsed: Duration) {
        if let Ok(mut phases) = self.0.lock() {
            phases.push(phase);
        }
    }
}

fn dispatcher(engine: &Arc<FakeEngine>, template: &str) -> Dispatcher {
    Dispatcher::builder(EntrypointModule::from_engine(engine.clone()))
        .with_template(TemplateSource::from_html(template))
        .with_config(RenderConfig::production())
        .build()
        .unwrap()
}

fn get(url: &str) -> IncomingRequest {
    IncomingRequest::get(url).unwrap()
}

async fn buffered(dispatcher: &Dispatcher, url: &str) -> ResponseEnvelope {
    dispatcher
        .dispatch(&get(url), DispatchInput::new())
        .await
        .unwrap()
        .into_response()
        .unwrap()
}

// === Asset Routing Tests ===

#[tokio::test]
async fn test_asset_passthrough_skips_engine() {
    let engine = FakeEngine::returning(RenderOutput::new("<p>page</p>"));
    let dispatcher = Dispatcher::builder(EntrypointModule::from_engine(engine.clone()))
        .with_template(TemplateSource::from_html(INDEX))
        .with_asset_handler(StaticFiles)
        .build()
        .unwrap();
    let (sink, _body) = ResponseSink::channel(4);

    let outcome = dispatcher
        .dispatch(
            &get("https://shop.example/img/logo.PNG"),
            DispatchInput::new().with_sink(sink),
        )
        .await
        .unwrap();

    let response = outcome.into_response().unwrap();
    assert_eq!(response.body_text(), "asset /img/logo.PNG");
    assert_eq!(response.header("content-type"), Some("image/png"));
    assert!(response.header("cache-control").is_none());
    assert_eq!(engine.calls(), (0, 0, 0));
}

#[tokio::test]
async fn test_asset_path_without_handler_renders() {
    let engine = FakeEngine::returning(RenderOutput::new("<p>page</p>"));
    let dispatcher = dispatcher(&engine, INDEX);

    let response = buffered(&dispatcher, "https://shop.example/app.js").await;

    assert!(response.body_text().contains("<p>page</p>"));
    assert_eq!(engine.calls(), (1, 0, 0));
}

// === Streaming Tests ===

#[tokio::test]
async fn test_hydration_streams_into_sink() {
    let engine = FakeEngine::returning(RenderOutput::default());
    let dispatcher = Dispatcher::builder(EntrypointModule::from_engine(engine.clone()))
        .with_template(TemplateSource::from_html(INDEX))
        .with_config(RenderConfig::dev())
        .build()
        .unwrap();
    let (sink, body) = ResponseSink::channel(8);

    let outcome = dispatcher
        .dispatch(
            &get("https://shop.example/react?page=2"),
            DispatchInput::new().with_sink(sink),
        )
        .await
        .unwrap();

    assert!(outcome.is_delegated());
    assert_eq!(engine.calls(), (0, 1, 0));

    let handoff = outcome.into_handoff().unwrap();
    assert_eq!(handoff.mode(), RenderMode::StreamingHydration);
    handoff.spawn().await.unwrap().unwrap();

    let (head, bytes) = body.collect().await;
    assert_eq!(head.map(|h| h.status), Some(StatusCode::OK));
    assert_eq!(bytes, b"hydrate:/react:true");
}

#[tokio::test]
async fn test_full_stream_receives_template() {
    let engine = FakeEngine::returning(RenderOutput::default());
    let dispatcher = dispatcher(&engine, INDEX);
    let (sink, body) = ResponseSink::channel(8);

    let outcome = dispatcher
        .dispatch(
            &get("https://shop.example/products/42"),
            DispatchInput::new().with_sink(sink),
        )
        .await
        .unwrap();

    assert_eq!(engine.calls(), (0, 0, 1));
    assert_eq!(
        engine.streamed_templates.lock().unwrap().as_slice(),
        &[INDEX.to_string()]
    );

    let handoff = outcome.into_handoff().unwrap();
    assert_eq!(handoff.mode(), RenderMode::StreamingFull);
    handoff.run().await.unwrap();

    let (head, bytes) = body.collect().await;
    let head = head.unwrap();
    assert_eq!(head.headers["content-type"], "text/html");
    assert_eq!(bytes, b"<p>stream /products/42</p>");
}

#[tokio::test]
async fn test_bot_request_never_streams() {
    let engine = FakeEngine::returning(RenderOutput::new("<p>crawlable</p>"));
    let dispatcher = dispatcher(&engine, INDEX);
    let (sink, _body) = ResponseSink::channel(4);

    let outcome = dispatcher
        .dispatch(
            &get("https://shop.example/products/42?_bot=1"),
            DispatchInput::new().with_sink(sink),
        )
        .await
        .unwrap();

    assert!(matches!(outcome, DispatchOutcome::Response(_)));
    assert_eq!(engine.calls(), (1, 0, 0));
}

#[tokio::test]
async fn test_stream_template_error_drops_sink() {
    let engine = FakeEngine::returning(RenderOutput::default());
    let dispatcher = Dispatcher::builder(EntrypointModule::from_engine(engine.clone()))
        .with_template(TemplateSource::provider(|_url: String| async {
            Err::<String, _>(anyhow::anyhow!("client build not ready"))
        }))
        .build()
        .unwrap();
    let (sink, mut body) = ResponseSink::channel(4);

    let err = dispatcher
        .dispatch(
            &get("https://shop.example/"),
            DispatchInput::new().with_sink(sink),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Template(TemplateError::Provider(_))));
    assert_eq!(err.to_string(), "client build not ready");
    assert_eq!(engine.calls(), (0, 0, 0));
    assert!(body.head().await.is_none());
}

// === Buffered Assembly Tests ===

#[tokio::test]
async fn test_root_mount_substitution() {
    let engine = FakeEngine::returning(RenderOutput::new("<p>Hello</p>"));
    let dispatcher = dispatcher(&engine, INDEX);

    let response = buffered(&dispatcher, "https://shop.example/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .body_text()
        .contains("<div id=\"root\" data-server-rendered=\"true\"><p>Hello</p></div>"));
    assert!(!response.body_text().contains("<div id=\"root\"></div>"));
}

#[tokio::test]
async fn test_title_replaces_template_title() {
    let head = HeadFragments::new()
        .with_title("<title>New</title>")
        .with(HeadCategory::Meta, "<meta name=\"description\" content=\"Shoes\">");
    let engine = FakeEngine::returning(RenderOutput::new("").with_head(head));
    let dispatcher = dispatcher(&engine, INDEX);

    let response = buffered(&dispatcher, "https://shop.example/products/shoe").await;
    let html = response.body_text();

    assert_eq!(html.matches("<title>").count(), 1);
    assert!(html.contains("<title>New</title>"));
    assert!(!html.contains("Old"));
    assert!(html.contains(
        "<head><meta name=\"description\" content=\"Shoes\"><meta charset=\"utf-8\"><title>New</title></head>"
    ));
}

#[tokio::test]
async fn test_no_title_in_no_title_out() {
    let engine = FakeEngine::returning(RenderOutput::new("<p>x</p>"));
    let dispatcher = dispatcher(&engine, BARE_INDEX);

    let response = buffered(&dispatcher, "https://shop.example/").await;

    assert!(!response.body_text().contains("<title"));
}

#[tokio::test]
async fn test_title_appended_when_template_has_none() {
    let head = HeadFragments::new().with_title("<title>Shop</title>");
    let engine = FakeEngine::returning(RenderOutput::new("").with_head(head));
    let dispatcher = dispatcher(&engine, BARE_INDEX);

    let response = buffered(&dispatcher, "https://shop.example/").await;

    assert!(response
        .body_text()
        .contains("<head><meta charset=\"utf-8\"><title>Shop</title></head>"));
}

#[tokio::test]
async fn test_tag_attributes() {
    let engine = FakeEngine::returning(
        RenderOutput::new("")
            .with_body_attributes("class=\"dark\"")
            .with_html_attributes("data-theme=\"shop\""),
    );
    let dispatcher = dispatcher(&engine, INDEX);

    let html = buffered(&dispatcher, "https://shop.example/").await.body_text().into_owned();

    assert!(html.contains("<body class=\"dark\">"));
    assert!(html.contains("<html data-theme=\"shop\" lang=\"en\">"));
}

#[tokio::test]
async fn test_empty_attributes_leave_tags() {
    let engine = FakeEngine::returning(
        RenderOutput::new("")
            .with_body_attributes("")
            .with_html_attributes(""),
    );
    let dispatcher = dispatcher(&engine, INDEX);

    let html = buffered(&dispatcher, "https://shop.example/").await.body_text().into_owned();

    assert!(html.contains("<html lang=\"en\">"));
    assert!(html.contains("<body><div id=\"root\""));
}

#[tokio::test]
async fn test_full_page_appends_content_type() {
    let mut component = ComponentResponse::new();
    component
        .headers_mut()
        .insert("content-type", HeaderValue::from_static("text/plain"));
    let engine =
        FakeEngine::returning(RenderOutput::new("").with_component_response(component));
    let dispatcher = dispatcher(&engine, INDEX);

    let response = buffered(&dispatcher, "https://shop.example/").await;

    let values: Vec<_> = response.headers.get_all("content-type").iter().collect();
    assert_eq!(values, vec!["text/plain", "text/html"]);
}

#[tokio::test]
async fn test_custom_body_returned_verbatim() {
    let mut component = ComponentResponse::new();
    component.set_status(StatusCode::CREATED);
    component
        .headers_mut()
        .insert("x-order", HeaderValue::from_static("A-1"));
    component.send("{\"ok\":true}");
    let engine = FakeEngine::returning(
        RenderOutput::new("<p>ignored</p>")
            .with_head(HeadFragments::new().with_title("<title>ignored</title>"))
            .with_component_response(component),
    );
    let dispatcher = dispatcher(&engine, INDEX);

    let response = buffered(&dispatcher, "https://shop.example/api/order").await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body, b"{\"ok\":true}");
    assert_eq!(response.header("x-order"), Some("A-1"));
    assert!(response.header("content-type").is_none());
    assert_eq!(
        response.header("cache-control"),
        Some(CachingStrategy::default().cache_control_header().as_str())
    );
}

#[tokio::test]
async fn test_redirect_has_empty_body() {
    let mut component = ComponentResponse::new();
    component.redirect("/account/login").unwrap();
    let engine = FakeEngine::returning(RenderOutput::new("").with_component_response(component));
    let dispatcher = dispatcher(&engine, INDEX);

    let response = buffered(&dispatcher, "https://shop.example/account").await;

    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header("location"), Some("/account/login"));
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_hydration_probe_without_sink_returns_body() {
    let engine = FakeEngine::rendering(|_url, options| {
        assert!(options.is_hydration_request);
        Ok(RenderOutput::new("{\"props\":{}}"))
    });
    let dispatcher = dispatcher(&engine, INDEX);

    let response = buffered(&dispatcher, "https://shop.example/react").await;

    assert_eq!(response.body_text(), "{\"props\":{}}");
    assert!(response.header("content-type").is_none());
    assert!(response.header("cache-control").is_some());
    assert_eq!(engine.calls(), (1, 0, 0));
}

// === Cache Header Tests ===

#[tokio::test]
async fn test_cache_control_matches_strategy() {
    let strategy = CachingStrategy::hours();
    let mut component = ComponentResponse::new();
    component.cache(strategy.clone());
    component
        .headers_mut()
        .insert("cache-control", HeaderValue::from_static("no-cache"));
    let engine = FakeEngine::returning(RenderOutput::new("").with_component_response(component));
    let dispatcher = dispatcher(&engine, INDEX);

    let response = buffered(&dispatcher, "https://shop.example/").await;

    let values: Vec<_> = response.headers.get_all("cache-control").iter().collect();
    assert_eq!(values.len(), 1);
    assert_eq!(values[0], strategy.cache_control_header().as_str());
    assert!(response.header("cache-control-preview").is_none());
}

#[tokio::test]
async fn test_dev_uses_preview_header() {
    let engine = FakeEngine::returning(RenderOutput::new(""));
    let dispatcher = Dispatcher::builder(EntrypointModule::from_engine(engine.clone()))
        .with_template(TemplateSource::from_html(INDEX))
        .with_config(RenderConfig::dev())
        .build()
        .unwrap();

    let response = buffered(&dispatcher, "https://shop.example/").await;

    assert_eq!(
        response.header("cache-control-preview"),
        Some(CachingStrategy::default().cache_control_header().as_str())
    );
    assert!(response.header("cache-control").is_none());
}

// === Context Tests ===

#[tokio::test]
async fn test_render_sees_request_context() {
    let engine = FakeEngine::rendering(|url, options| {
        assert_eq!(url.path(), "/products/shoe");
        assert_eq!(options.request.url.as_str(), url.as_str());
        assert!(!options.is_hydration_request);
        assert!(!options.dev);
        assert!(options.context.cache().is_some());
        let tenant = options.context.value().get::<String>().cloned();
        Ok(RenderOutput::new(format!(
            "<p>{}</p>",
            tenant.unwrap_or_default()
        )))
    });
    let dispatcher = Dispatcher::builder(EntrypointModule::from_engine(engine.clone()))
        .with_template(TemplateSource::from_html(INDEX))
        .with_cache(Arc::new(InMemoryCacheStore::new()))
        .build()
        .unwrap();

    let outcome = dispatcher
        .dispatch(
            &get("https://shop.example/products/shoe"),
            DispatchInput::new().with_context(ContextValue::new("acme".to_string())),
        )
        .await
        .unwrap();

    assert!(outcome
        .into_response()
        .unwrap()
        .body_text()
        .contains("<p>acme</p>"));
}

#[tokio::test]
async fn test_concurrent_dispatches_keep_their_context() {
    let engine = FakeEngine::rendering(|_url, options| {
        let tenant = options.context.value().get::<String>().cloned();
        Ok(RenderOutput::new(format!(
            "<p>{}:{}</p>",
            tenant.unwrap_or_default(),
            options.context.request_id()
        )))
    });
    let dispatcher = Arc::new(dispatcher(&engine, INDEX));

    let mut handles = Vec::new();
    for tenant in ["alpha", "beta", "gamma", "delta"] {
        let dispatcher = Arc::clone(&dispatcher);
        handles.push(tokio::spawn(async move {
            let request = get("https://shop.example/").with_request_id(
                storefront_core::RequestId::from_string(format!("req-{}", tenant)),
            );
            let response = dispatcher
                .dispatch(
                    &request,
                    DispatchInput::new().with_context(ContextValue::new(tenant.to_string())),
                )
                .await
                .unwrap()
                .into_response()
                .unwrap();
            (tenant, response.body_text().into_owned())
        }));
    }

    for handle in handles {
        let (tenant, html) = handle.await.unwrap();
        assert!(html.contains(&format!("<p>{}:req-{}</p>", tenant, tenant)));
    }
}

#[tokio::test]
async fn test_template_provider_keyed_by_url() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);
    let engine = FakeEngine::returning(RenderOutput::new("<p>x</p>"));
    let dispatcher = Dispatcher::builder(EntrypointModule::from_engine(engine.clone()))
        .with_template(TemplateSource::provider(move |url: String| {
            if let Ok(mut seen) = recorded.lock() {
                seen.push(url);
            }
            async { Ok::<_, anyhow::Error>(BARE_INDEX.to_string()) }
        }))
        .build()
        .unwrap();

    buffered(&dispatcher, "https://shop.example/search?q=boots").await;

    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &["https://shop.example/search?q=boots".to_string()]
    );
}

// === Error Tests ===

#[tokio::test]
async fn test_render_error_propagates() {
    let engine = FakeEngine::rendering(|_url, _options| Err(anyhow::anyhow!("catalog offline")));
    let phases = Arc::new(Phases::default());
    let dispatcher = Dispatcher::builder(EntrypointModule::from_engine(engine.clone()))
        .with_template(TemplateSource::from_html(INDEX))
        .with_observer(phases.clone())
        .build()
        .unwrap();

    let err = dispatcher
        .dispatch(&get("https://shop.example/"), DispatchInput::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Render(_)));
    assert_eq!(err.to_string(), "catalog offline");
    assert_eq!(
        phases.0.lock().unwrap().as_slice(),
        &[
            DispatchPhase::Start,
            DispatchPhase::Error("catalog offline".to_string())
        ]
    );
}

#[test]
fn test_missing_template_rejected() {
    let engine = FakeEngine::returning(RenderOutput::default());

    let err = Dispatcher::builder(EntrypointModule::from_engine(engine))
        .build()
        .unwrap_err();

    assert_eq!(err, storefront_dispatch::ConfigError::MissingTemplate);
}

// === Lifecycle Tests ===

#[tokio::test]
async fn test_observer_phases() {
    let engine = FakeEngine::returning(RenderOutput::new("<p>x</p>"));
    let phases = Arc::new(Phases::default());
    let dispatcher = Dispatcher::builder(EntrypointModule::from_engine(engine.clone()))
        .with_template(TemplateSource::from_html(INDEX))
        .with_asset_handler(StaticFiles)
        .with_observer(phases.clone())
        .build()
        .unwrap();

    buffered(&dispatcher, "https://shop.example/").await;
    buffered(&dispatcher, "https://shop.example/favicon.ico").await;
    let (sink, _body) = ResponseSink::channel(4);
    dispatcher
        .dispatch(
            &get("https://shop.example/react"),
            DispatchInput::new().with_sink(sink),
        )
        .await
        .unwrap();

    assert_eq!(
        phases.0.lock().unwrap().as_slice(),
        &[
            DispatchPhase::Start,
            DispatchPhase::Rendered,
            DispatchPhase::Start,
            DispatchPhase::AssetServed,
            DispatchPhase::Start,
            DispatchPhase::Delegated,
        ]
    );
}
