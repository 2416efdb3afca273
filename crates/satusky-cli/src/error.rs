//! CLI error types.

use satusky_deploy::DeployError;
use satusky_proto::ResourceExhausted;
use satusky_validation::ValidationError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// The deploy pipeline or a platform call failed.
    #[error(transparent)]
    Deploy(#[from] DeployError),

    /// A flag value was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Quota details when the platform refused for lack of resources.
    #[must_use]
    pub const fn resource_exhausted(&self) -> Option<&ResourceExhausted> {
        match self {
            Self::Deploy(e) => e.resource_exhausted(),
            _ => None,
        }
    }
}
