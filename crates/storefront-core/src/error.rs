//! Error types for core request handling.

use thiserror::Error;

/// Errors raised while building requests and responses.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The request URL could not be parsed.
    #[error("Invalid request URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A header name or value was not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl From<http::header::InvalidHeaderValue> for CoreError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        CoreError::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for CoreError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        CoreError::InvalidHeader(err.to_string())
    }
}
