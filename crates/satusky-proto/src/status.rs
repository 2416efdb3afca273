//! Deployment status as reported by `/deployments/status/{id}`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProtoError;

/// Lifecycle phase of a deployment.
///
/// ```text
/// pending -> creating -> running -> completed
///                               \-> failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentPhase {
    /// Accepted but not yet scheduled.
    Pending,
    /// Resources are being created.
    Creating,
    /// Containers are running, rollout not finished.
    Running,
    /// Rollout finished successfully.
    Completed,
    /// Rollout failed.
    Failed,
}

impl DeploymentPhase {
    /// Returns true for `completed` and `failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Creating => "creating",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DeploymentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentPhase {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "creating" => Ok(Self::Creating),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(ProtoError::UnknownStatus(other.to_string())),
        }
    }
}

/// One status poll result.
///
/// `status` stays a string on the wire so that an unknown value reaches the
/// caller as a protocol error instead of a decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Raw status value.
    pub status: String,
    /// Progress percentage, 0-100.
    #[serde(default)]
    pub progress: u8,
    /// Server-supplied message.
    #[serde(default)]
    pub message: String,
}

impl StatusReport {
    /// Creates a report for a known phase.
    #[must_use]
    pub fn new(phase: DeploymentPhase, progress: u8, message: impl Into<String>) -> Self {
        Self {
            status: phase.as_str().to_string(),
            progress: progress.min(100),
            message: message.into(),
        }
    }

    /// Parse the status into a known phase.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::UnknownStatus`] for values outside the set.
    pub fn phase(&self) -> Result<DeploymentPhase, ProtoError> {
        self.status.parse()
    }
}
