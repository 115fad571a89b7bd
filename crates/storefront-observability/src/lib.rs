//! Observability for the storefront dispatcher.
//!
//! - `StructuredLogger` - Request-scoped structured logging emitted as
//!   `tracing` events under the `storefront` target
//! - `LogBuilder` - Fluent construction of entries with extra fields

mod logging;

pub use logging::*;

// Re-export RequestId and TimingContext from storefront-core for convenience
pub use storefront_core::{RequestId, TimingContext};
