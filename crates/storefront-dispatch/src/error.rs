//! Dispatch error types.

use thiserror::Error;

use storefront_template::TemplateError;

use crate::entrypoint::Capability;

/// Errors detected while assembling a dispatcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "Server entrypoint is missing {}. The server bundle probably failed to build; check the build output for errors",
        join_capabilities(.missing)
    )]
    MissingCapabilities { missing: Vec<Capability> },

    #[error("No HTML template configured")]
    MissingTemplate,
}

fn join_capabilities(missing: &[Capability]) -> String {
    missing
        .iter()
        .map(|c| format!("`{}`", c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors surfaced by a single dispatch.
///
/// Collaborator failures are wrapped transparently so their message and
/// source chain reach the caller unchanged.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Render(anyhow::Error),

    #[error(transparent)]
    Asset(anyhow::Error),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_capabilities_message() {
        let err = ConfigError::MissingCapabilities {
            missing: vec![Capability::Hydrate, Capability::Stream],
        };

        assert_eq!(
            err.to_string(),
            "Server entrypoint is missing `hydrate`, `stream`. The server bundle probably failed to build; check the build output for errors"
        );
    }

    #[test]
    fn test_render_error_is_transparent() {
        let err = DispatchError::Render(anyhow::anyhow!("product 42 not found"));
        assert_eq!(err.to_string(), "product 42 not found");
    }
}
