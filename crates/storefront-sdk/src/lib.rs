//! Public SDK for the storefront request dispatcher.
//!
//! This crate re-exports all dispatcher functionality:
//!
//! ```ignore
//! use storefront_sdk::prelude::*;
//!
//! let dispatcher = Dispatcher::builder(EntrypointModule::from_engine(engine))
//!     .with_template(TemplateSource::from_file("dist/client/index.html")?)
//!     .with_cache(Arc::new(InMemoryCacheStore::new()))
//!     .build()?;
//!
//! let (sink, body) = ResponseSink::channel(16);
//! match dispatcher.dispatch(&request, DispatchInput::new().with_sink(sink)).await? {
//!     DispatchOutcome::Response(response) => send(response.into_http()),
//!     DispatchOutcome::Delegated(handoff) => {
//!         handoff.spawn();
//!         send_stream(body)
//!     }
//! }
//! ```

pub use storefront_cache;
pub use storefront_core;
pub use storefront_dispatch;
pub use storefront_observability;
pub use storefront_streaming;
pub use storefront_template;

/// Prelude for convenient imports.
pub mod prelude {
    pub use storefront_cache::*;
    pub use storefront_core::*;
    pub use storefront_dispatch::*;
    pub use storefront_observability::*;
    pub use storefront_streaming::*;
    pub use storefront_template::*;
}
