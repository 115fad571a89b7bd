//! Template error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading templates.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The template file could not be read.
    #[error("Failed to read template {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template provider failed.
    #[error(transparent)]
    Provider(anyhow::Error),
}
