//! Configuration and template checks.

use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use storefront_cache::cache_control_header_name;
use storefront_template::{HtmlTemplate, TemplateSlots, ROOT_MOUNT};

use super::CheckArgs;
use crate::context::Context;
use crate::output::{format_bytes, slot_badge};

#[derive(Debug, Serialize)]
struct CheckReport {
    config: Option<String>,
    environment: Option<String>,
    dev: bool,
    cache_header: String,
    template: String,
    template_bytes: u64,
    root_mount: bool,
    head: bool,
    body: bool,
    html: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

/// Run the check command.
pub async fn run(args: CheckArgs, ctx: &Context) -> Result<()> {
    let path = match &args.template {
        Some(path) => ctx.resolve_path(path),
        None => ctx.template_path(),
    };

    ctx.output.debug(&format!("Reading template {}", path.display()));
    let html = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read template: {}", path.display()))?;
    let template_bytes = html.len() as u64;
    let template = HtmlTemplate::parse(html);
    let slots = template.slots();
    let (errors, warnings) = diagnose(slots);

    let report = CheckReport {
        config: ctx.config_path.as_ref().map(|p| p.display().to_string()),
        environment: ctx.env.clone(),
        dev: ctx.config.dev,
        cache_header: cache_control_header_name(ctx.config.dev).to_string(),
        template: path.display().to_string(),
        template_bytes,
        root_mount: slots.root_mount,
        head: slots.head,
        body: slots.body,
        html: slots.html,
        errors,
        warnings,
    };

    if ctx.output.is_json() {
        ctx.output.json(&report);
    } else {
        print_report(&report, ctx);
    }

    if !report.errors.is_empty() {
        bail!("Template has {} error(s)", report.errors.len());
    }

    ctx.output.success("Storefront setup looks good");
    Ok(())
}

fn print_report(report: &CheckReport, ctx: &Context) {
    ctx.output.header("Storefront check");

    ctx.output
        .kv("config", report.config.as_deref().unwrap_or("(defaults)"));
    if let Some(env) = &report.environment {
        ctx.output.kv("environment", env);
    }
    ctx.output
        .kv("mode", if report.dev { "development" } else { "production" });
    ctx.output.kv("cache header", &report.cache_header);
    ctx.output.kv(
        "template",
        &format!("{} ({})", report.template, format_bytes(report.template_bytes)),
    );

    ctx.output.header("Template slots");
    ctx.output
        .list_item(&format!("root mount  {}", slot_badge(report.root_mount)));
    ctx.output
        .list_item(&format!("<head>      {}", slot_badge(report.head)));
    ctx.output
        .list_item(&format!("<body       {}", slot_badge(report.body)));
    ctx.output
        .list_item(&format!("<html       {}", slot_badge(report.html)));

    for error in &report.errors {
        ctx.output.error(&format!("Error: {}", error));
    }
    for warning in &report.warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }
}

/// Errors and warnings for a template's slots.
fn diagnose(slots: TemplateSlots) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !slots.root_mount {
        errors.push(format!(
            "no root mount `{}`; rendered markup would be dropped",
            ROOT_MOUNT
        ));
    }
    if !slots.head {
        warnings.push("no `<head>...</head>` block; head fragments will not be inserted".to_string());
    }
    if !slots.body {
        warnings.push("no `<body` tag; body attributes will not be applied".to_string());
    }
    if !slots.html {
        warnings.push("no `<html` tag; html attributes will not be applied".to_string());
    }

    (errors, warnings)
}
