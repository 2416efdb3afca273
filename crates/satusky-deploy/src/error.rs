//! Error types for the deploy pipeline.
//!
//! Every variant belongs to one of the user-facing failure categories
//! returned by [`DeployError::category`].

use std::path::PathBuf;
use std::time::Duration;

use satusky_proto::{ProtoError, ResourceExhausted};
use satusky_validation::{CommandError, ValidationError};
use thiserror::Error;

/// Result type alias for deploy operations.
pub type DeployResult<T> = Result<T, DeployError>;

/// User-facing failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Rejected before any remote call.
    Preflight,
    /// Local container tool missing or failing.
    Toolchain,
    /// Image upload rejected or not delivered.
    Upload,
    /// Non-2xx response from a resource endpoint.
    Remote,
    /// Unparseable response or unknown status value.
    Protocol,
    /// Status wait exceeded its deadline.
    Timeout,
    /// Quota exceeded for the current tier.
    ResourceExhausted,
}

impl ErrorCategory {
    /// Returns the category name used in messages and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Preflight => "preflight",
            Self::Toolchain => "toolchain",
            Self::Upload => "upload",
            Self::Remote => "remote",
            Self::Protocol => "protocol",
            Self::Timeout => "timeout",
            Self::ResourceExhausted => "resource-exhausted",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while deploying.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Missing credentials or another precondition failed.
    #[error("{0}")]
    Preflight(String),

    /// A flag or request field failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No build recipe was found in any candidate location.
    #[error("no Dockerfile found in {}", .dir.display())]
    NoRecipe {
        /// Directory that was searched.
        dir: PathBuf,
    },

    /// The build recipe was rejected.
    #[error("invalid Dockerfile {}:\n  {}", .path.display(), .errors.join("\n  "))]
    InvalidRecipe {
        /// Recipe that was checked.
        path: PathBuf,
        /// One entry per rejected line.
        errors: Vec<String>,
    },

    /// A requested machine belongs to someone else.
    #[error("machine {machine} is not owned by you")]
    Unauthorized {
        /// Machine name as given on the command line.
        machine: String,
    },

    /// The local container tool or git failed.
    #[error("toolchain error: {0}")]
    Toolchain(#[from] CommandError),

    /// The image upload was rejected.
    #[error("image upload failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Upload {
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Transport or server message.
        message: String,
    },

    /// A resource endpoint answered with an error.
    #[error("{message}")]
    Remote {
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// The server's `message` field, or the transport error.
        message: String,
    },

    /// A response could not be understood.
    #[error("unexpected response: {0}")]
    Protocol(String),

    /// The deployment did not reach a terminal state in time.
    #[error("timed out after {}s waiting for deployment to finish", .waited.as_secs())]
    Timeout {
        /// How long the waiter polled.
        waited: Duration,
    },

    /// The deployment reached the `failed` state.
    #[error("deployment failed: {message}")]
    DeploymentFailed {
        /// Server-supplied message.
        message: String,
    },

    /// The platform refused the request because a quota was exceeded.
    #[error("{} quota exceeded: requested {}, available {}", .0.resource, .0.requested, .0.available)]
    ResourceExhausted(ResourceExhausted),

    /// Local I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    /// Creates a preflight error.
    #[must_use]
    pub fn preflight(message: impl Into<String>) -> Self {
        Self::Preflight(message.into())
    }

    /// Creates a remote error.
    #[must_use]
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Creates an upload error.
    #[must_use]
    pub fn upload(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upload {
            status,
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(message: impl std::fmt::Display) -> Self {
        Self::Protocol(message.to_string())
    }

    /// The failure category this error is reported under.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Preflight(_)
            | Self::Validation(_)
            | Self::NoRecipe { .. }
            | Self::InvalidRecipe { .. }
            | Self::Unauthorized { .. } => ErrorCategory::Preflight,
            Self::Toolchain(_) | Self::Io(_) => ErrorCategory::Toolchain,
            Self::Upload { .. } => ErrorCategory::Upload,
            Self::Remote { .. } | Self::DeploymentFailed { .. } => ErrorCategory::Remote,
            Self::Protocol(_) => ErrorCategory::Protocol,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::ResourceExhausted(_) => ErrorCategory::ResourceExhausted,
        }
    }

    /// The quota details, when this is a resource-exhausted error.
    #[must_use]
    pub const fn resource_exhausted(&self) -> Option<&ResourceExhausted> {
        match self {
            Self::ResourceExhausted(details) => Some(details),
            _ => None,
        }
    }
}

impl From<ProtoError> for DeployError {
    fn from(err: ProtoError) -> Self {
        match err {
            ProtoError::Platform(message) => Self::remote(None, message),
            other => Self::protocol(other),
        }
    }
}
