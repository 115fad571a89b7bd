//! Core abstractions for the storefront request dispatcher.
//!
//! This crate provides the fundamental types:
//! - `IncomingRequest` - The request being dispatched
//! - `RenderContext` - Per-request cache, context value and config
//! - `ComponentResponse` - Status, headers and cache policy set while rendering
//! - `ResponseEnvelope` - The response handed back to the server adapter
//! - `StorefrontConfig` - File-based configuration
//! - `DispatchPhase` - Dispatch lifecycle tracking

mod component;
mod config;
mod context;
mod error;
mod lifecycle;
mod request;
mod response;

pub use component::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use lifecycle::*;
pub use request::*;
pub use response::*;
