//! Sink error types.

use thiserror::Error;

/// Errors raised when writing to a response sink.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Status and headers were already written.
    #[error("Response head already written")]
    HeadAlreadyWritten,

    /// The sink was closed.
    #[error("Response sink already closed")]
    Closed,

    /// The underlying transport rejected the write.
    #[error("Streaming error: {0}")]
    Transport(String),
}
