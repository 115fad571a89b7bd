//! Streaming invocation.
//!
//! Both streaming modes move the live sink into the engine and return a
//! [`StreamingHandoff`]. The dispatcher never waits for the engine to
//! finish; whoever receives the handoff decides how the task runs.

use std::fmt;

use storefront_core::{IncomingRequest, RenderContext, RequestId};
use storefront_streaming::ResponseSink;
use storefront_template::TemplateSource;
use tokio::task::JoinHandle;

use crate::entrypoint::{Entrypoint, HydrateOptions, StreamOptions, StreamTask};
use crate::error::DispatchError;
use crate::mode::RenderMode;

/// Sink ownership passed to the engine, plus the work it started.
pub struct StreamingHandoff {
    mode: RenderMode,
    request_id: RequestId,
    task: StreamTask,
}

impl StreamingHandoff {
    /// Mode that produced this handoff.
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Request the engine is serving.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Take the engine's task to drive it yourself.
    pub fn into_task(self) -> StreamTask {
        self.task
    }

    /// Drive the engine's task to completion on the current task.
    pub async fn run(self) -> anyhow::Result<()> {
        self.task.await
    }

    /// Run the engine's task on the tokio runtime.
    pub fn spawn(self) -> JoinHandle<anyhow::Result<()>> {
        let request_id = self.request_id;
        let mode = self.mode;
        let task = self.task;
        tokio::spawn(async move {
            let result = task.await;
            if let Err(e) = &result {
                tracing::warn!(
                    target: storefront_observability::LOG_TARGET,
                    request_id = %request_id,
                    mode = %mode,
                    "streaming task failed: {:#}",
                    e
                );
            }
            result
        })
    }
}

impl fmt::Debug for StreamingHandoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingHandoff")
            .field("mode", &self.mode)
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

/// Hand the sink to the engine's `hydrate` capability.
pub fn invoke_hydrate(
    entrypoint: &Entrypoint,
    request: &IncomingRequest,
    context: RenderContext,
    sink: ResponseSink,
) -> StreamingHandoff {
    let dev = context.is_dev();
    let request_id = context.request_id().clone();
    let options = HydrateOptions {
        context,
        request: request.clone(),
        sink,
        dev,
    };

    StreamingHandoff {
        mode: RenderMode::StreamingHydration,
        request_id,
        task: entrypoint.hydrate().hydrate(request.url.clone(), options),
    }
}

/// Resolve the template and hand the sink to the engine's `stream`
/// capability.
///
/// If the template cannot be resolved the sink is dropped unused and the
/// error is returned.
pub async fn invoke_stream(
    entrypoint: &Entrypoint,
    templates: &TemplateSource,
    request: &IncomingRequest,
    context: RenderContext,
    sink: ResponseSink,
) -> Result<StreamingHandoff, DispatchError> {
    let template = templates.resolve(request.url.as_str()).await?;

    let dev = context.is_dev();
    let request_id = context.request_id().clone();
    let options = StreamOptions {
        context,
        request: request.clone(),
        sink,
        template,
        dev,
    };

    Ok(StreamingHandoff {
        mode: RenderMode::StreamingFull,
        request_id,
        task: entrypoint.stream().stream(request.url.clone(), options),
    })
}
