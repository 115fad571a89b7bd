//! Streaming primitives for the storefront dispatcher.
//!
//! - `ResponseSink` - Live response sink owned by a streaming entrypoint
//! - `StreamingBody` - Receiving half read by the server adapter
//! - `ResponseHead` - Status and headers written before the first chunk

mod error;
mod sink;

pub use error::*;
pub use sink::*;
