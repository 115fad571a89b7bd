//! Buffered full-page assembly.

use http::HeaderValue;
use storefront_cache::cache_control_header_name;
use storefront_core::{IncomingRequest, RenderContext, ResponseEnvelope};
use storefront_template::{TemplateFill, TemplateSource};

use crate::entrypoint::{Entrypoint, RenderOptions, RenderOutput};
use crate::error::DispatchError;
use crate::mode::is_hydration_request;

/// Render a request to a string and build its response.
///
/// The cache-control header is written into the component headers first,
/// replacing any value already set under that name. A custom body is then
/// returned verbatim, and the hydration probe path gets the rendered body
/// verbatim. Every other request gets the rendered body and head filled
/// into the template, with `content-type: text/html` appended.
pub async fn assemble(
    entrypoint: &Entrypoint,
    templates: &TemplateSource,
    request: &IncomingRequest,
    context: &RenderContext,
) -> Result<ResponseEnvelope, DispatchError> {
    let is_hydration_request = is_hydration_request(&request.url);
    let options = RenderOptions {
        request,
        context,
        is_hydration_request,
        dev: context.is_dev(),
    };

    let RenderOutput {
        body,
        head,
        body_attributes,
        html_attributes,
        component_response,
    } = entrypoint
        .render()
        .render(&request.url, options)
        .await
        .map_err(DispatchError::Render)?;

    let cache_control = HeaderValue::try_from(component_response.cache_control_header())?;
    let (status, mut headers, custom_body) = component_response.into_parts();
    headers.insert(cache_control_header_name(context.is_dev()), cache_control);
    let status = ResponseEnvelope::status_or_default(status);

    if let Some(custom_body) = custom_body {
        return Ok(ResponseEnvelope::new(status, headers, custom_body));
    }

    if is_hydration_request {
        return Ok(ResponseEnvelope::new(status, headers, body));
    }

    let template = templates.resolve(request.url.as_str()).await?;
    let html = template.render(&TemplateFill {
        body: &body,
        head: &head,
        body_attributes: non_empty(&body_attributes),
        html_attributes: non_empty(&html_attributes),
    });

    Ok(ResponseEnvelope::html(status, headers, html))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
