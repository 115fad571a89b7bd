//! Request dispatcher for storefront rendering.
//!
//! One call to [`Dispatcher::dispatch`] handles one request and takes
//! exactly one of four paths:
//!
//! 1. asset passthrough, when the path looks like a static asset and an
//!    [`AssetHandler`] is configured;
//! 2. streaming hydration, for `/react` requests with a live sink;
//! 3. streaming full page, for other requests with a live sink;
//! 4. buffered full page, for everything else (including `?_bot`
//!    requests, which need a complete `<head>` for crawlers).
//!
//! Streaming paths hand the sink to the rendering engine and return
//! [`DispatchOutcome::Delegated`]; the other paths return a complete
//! [`ResponseEnvelope`](storefront_core::ResponseEnvelope).

mod asset;
mod buffered;
mod dispatcher;
mod entrypoint;
mod error;
mod mode;
mod streaming;

pub use asset::*;
pub use buffered::*;
pub use dispatcher::*;
pub use entrypoint::*;
pub use error::*;
pub use mode::*;
pub use streaming::*;
