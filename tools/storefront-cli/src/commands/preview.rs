//! Render a URL through the dispatcher with a fixture entrypoint.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use http::StatusCode;
use serde::Serialize;
use storefront_core::{ComponentResponse, IncomingRequest};
use storefront_dispatch::{
    DispatchInput, DispatchOutcome, Dispatcher, EntrypointModule, Hydrate, HydrateOptions, Render,
    RenderOptions, RenderOutput, Stream, StreamOptions, StreamTask,
};
use storefront_observability::{LogFormat, LogLevel};
use storefront_streaming::{ResponseHead, ResponseSink};
use storefront_template::{HeadCategory, HeadFragments, TemplateFill, TemplateSource};
use url::Url;

use super::PreviewArgs;
use crate::context::Context;
use crate::output::format_bytes;

/// Entrypoint that renders the same output for every URL.
struct FixtureEngine {
    output: RenderOutput,
}

#[async_trait]
impl Render for FixtureEngine {
    async fn render(&self, _url: &Url, _options: RenderOptions<'_>) -> Result<RenderOutput> {
        Ok(self.output.clone())
    }
}

impl Hydrate for FixtureEngine {
    fn hydrate(&self, _url: Url, options: HydrateOptions) -> StreamTask {
        let HydrateOptions { mut sink, .. } = options;
        let body = self.output.body.clone();
        Box::pin(async move {
            sink.write(body).await?;
            sink.close().await?;
            Ok(())
        })
    }
}

impl Stream for FixtureEngine {
    fn stream(&self, _url: Url, options: StreamOptions) -> StreamTask {
        let StreamOptions {
            mut sink, template, ..
        } = options;
        let output = self.output.clone();
        Box::pin(async move {
            let html = template.render(&TemplateFill {
                body: &output.body,
                head: &output.head,
                body_attributes: output.body_attributes.as_deref(),
                html_attributes: output.html_attributes.as_deref(),
            });
            let mut head = ResponseHead::new(
                output
                    .component_response
                    .status()
                    .unwrap_or(StatusCode::OK),
            );
            head.headers = output.component_response.headers().clone();
            sink.write_head(head)?;
            sink.write(html).await?;
            sink.close().await?;
            Ok(())
        })
    }
}

#[derive(Debug, Serialize)]
struct PreviewReport {
    url: String,
    streamed: bool,
    status: u16,
    headers: BTreeMap<String, String>,
    body: String,
}

/// Run the preview command.
pub async fn run(args: PreviewArgs, ctx: &Context) -> Result<()> {
    let output = fixture_output(&args)?;

    let template_path = match &args.template {
        Some(path) => ctx.resolve_path(path),
        None => ctx.template_path(),
    };
    ctx.output
        .debug(&format!("Using template {}", template_path.display()));
    let templates = TemplateSource::from_file(&template_path)?;

    let log_level = ctx
        .config
        .log
        .level
        .parse::<LogLevel>()
        .unwrap_or_else(|e| {
            ctx.output.warn(&format!("{}, using info", e));
            LogLevel::Info
        });
    let log_format = if ctx.config.log.json {
        LogFormat::Json
    } else {
        LogFormat::Human
    };

    let engine = Arc::new(FixtureEngine { output });
    let dispatcher = Dispatcher::builder(EntrypointModule::from_engine(engine))
        .with_template(templates)
        .with_config(ctx.config.render_config())
        .with_log_level(log_level)
        .with_log_format(log_format)
        .build()?;

    let request = IncomingRequest::get(&args.url)
        .with_context(|| format!("Invalid preview URL: {}", args.url))?;

    let report = if args.stream {
        let (sink, body) = ResponseSink::channel(16);
        match dispatcher
            .dispatch(&request, DispatchInput::new().with_sink(sink))
            .await?
        {
            DispatchOutcome::Response(response) => report_response(&args.url, response),
            DispatchOutcome::Delegated(handoff) => {
                ctx.output
                    .debug(&format!("Sink delegated ({})", handoff.mode()));
                let task = handoff.spawn();
                let (head, bytes) = body.collect().await;
                task.await.context("Streaming task panicked")??;
                let head = head.unwrap_or_default();
                PreviewReport {
                    url: args.url.clone(),
                    streamed: true,
                    status: head.status.as_u16(),
                    headers: header_map(&head.headers),
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                }
            }
        }
    } else {
        let outcome = dispatcher.dispatch(&request, DispatchInput::new()).await?;
        match outcome {
            DispatchOutcome::Response(response) => report_response(&args.url, response),
            DispatchOutcome::Delegated(_) => anyhow::bail!("Dispatcher streamed without a sink"),
        }
    };

    print_report(&report, ctx);
    Ok(())
}

fn fixture_output(args: &PreviewArgs) -> Result<RenderOutput> {
    let mut head = HeadFragments::new();
    if let Some(title) = &args.title {
        head = head.with_title(title_element(title));
    }
    if let Some(meta) = &args.meta {
        head = head.with(HeadCategory::Meta, meta.clone());
    }

    let mut component = ComponentResponse::new();
    if let Some(status) = args.status {
        let status = StatusCode::from_u16(status)
            .with_context(|| format!("Invalid status code: {}", status))?;
        component.set_status(status);
    }

    let mut output = RenderOutput::new(args.body.clone())
        .with_head(head)
        .with_component_response(component);
    output.body_attributes = args.body_attrs.clone();
    output.html_attributes = args.html_attrs.clone();
    Ok(output)
}

/// Wrap plain text in a title element; markup is kept as given.
fn title_element(title: &str) -> String {
    if title.trim_start().starts_with("<title") {
        title.to_string()
    } else {
        format!("<title>{}</title>", title)
    }
}

fn report_response(url: &str, response: storefront_core::ResponseEnvelope) -> PreviewReport {
    PreviewReport {
        url: url.to_string(),
        streamed: false,
        status: response.status.as_u16(),
        headers: header_map(&response.headers),
        body: response.body_text().into_owned(),
    }
}

fn header_map(headers: &http::HeaderMap) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        map.entry(name.to_string())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.clone());
    }
    map
}

fn print_report(report: &PreviewReport, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(report);
        return;
    }

    if ctx.output.is_verbose() {
        ctx.output.header(&format!("{} {}", report.status, report.url));
        ctx.output
            .kv("streamed", if report.streamed { "yes" } else { "no" });
        ctx.output
            .kv("size", &format_bytes(report.body.len() as u64));
        for (name, value) in &report.headers {
            ctx.output.kv(name, value);
        }
        ctx.output.info("");
    }

    ctx.output.raw(&report.body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn args(url: &str) -> PreviewArgs {
        PreviewArgs {
            url: url.to_string(),
            body: "<p>preview</p>".to_string(),
            title: None,
            meta: None,
            body_attrs: None,
            html_attrs: None,
            status: None,
            template: None,
            stream: false,
        }
    }

    #[test]
    fn test_title_element() {
        assert_eq!(title_element("Shoes"), "<title>Shoes</title>");
        assert_eq!(title_element("<title>Boots</title>"), "<title>Boots</title>");
    }

    #[test]
    fn test_fixture_output() {
        let mut args = args("https://shop.example/");
        args.title = Some("Shop".to_string());
        args.status = Some(404);
        args.body_attrs = Some("class=\"dark\"".to_string());

        let output = fixture_output(&args).unwrap();

        assert_eq!(output.head.title(), Some("<title>Shop</title>"));
        assert_eq!(output.component_response.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(output.body_attributes.as_deref(), Some("class=\"dark\""));
    }

    #[test]
    fn test_invalid_status_rejected() {
        let mut args = args("https://shop.example/");
        args.status = Some(42);

        assert!(fixture_output(&args).is_err());
    }

    #[test]
    fn test_header_map_joins_repeated() {
        let mut headers = http::HeaderMap::new();
        headers.append("content-type", HeaderValue::from_static("text/plain"));
        headers.append("content-type", HeaderValue::from_static("text/html"));

        let map = header_map(&headers);

        assert_eq!(map["content-type"], "text/plain, text/html");
    }

    #[tokio::test]
    async fn test_fixture_engine_renders_buffered_page() {
        let engine = Arc::new(FixtureEngine {
            output: fixture_output(&args("https://shop.example/")).unwrap(),
        });
        let dispatcher = Dispatcher::builder(EntrypointModule::from_engine(engine))
            .with_template(TemplateSource::from_html(
                "<html><head></head><body><div id=\"root\"></div></body></html>",
            ))
            .build()
            .unwrap();
        let request = IncomingRequest::get("https://shop.example/").unwrap();

        let response = dispatcher
            .dispatch(&request, DispatchInput::new())
            .await
            .unwrap()
            .into_response()
            .unwrap();
        let report = report_response("https://shop.example/", response);

        assert_eq!(report.status, 200);
        assert!(report.body.contains("<p>preview</p>"));
        assert_eq!(report.headers["content-type"], "text/html");
    }
}
