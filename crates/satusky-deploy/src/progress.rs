//! Step announcements for the deploy pipeline.

use std::fmt;

use crate::cleanup::CreatedResource;
use crate::error::DeployError;

/// The five pipeline steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Build the image locally and upload it.
    BuildAndUpload,
    /// Select hosts and create the deployment record.
    CreateDeployment,
    /// Create the service.
    CreateService,
    /// Create the environment and volume concurrently.
    EnvironmentAndVolume,
    /// Create the ingress and dependencies concurrently.
    IngressAndDependencies,
}

impl Step {
    /// All steps in execution order.
    pub const ALL: [Self; 5] = [
        Self::BuildAndUpload,
        Self::CreateDeployment,
        Self::CreateService,
        Self::EnvironmentAndVolume,
        Self::IngressAndDependencies,
    ];

    /// 1-based position.
    #[must_use]
    pub const fn number(&self) -> usize {
        match self {
            Self::BuildAndUpload => 1,
            Self::CreateDeployment => 2,
            Self::CreateService => 3,
            Self::EnvironmentAndVolume => 4,
            Self::IngressAndDependencies => 5,
        }
    }

    /// Label shown to the user.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::BuildAndUpload => "Building and uploading image",
            Self::CreateDeployment => "Creating deployment",
            Self::CreateService => "Creating service",
            Self::EnvironmentAndVolume => "Configuring environment and volume",
            Self::IngressAndDependencies => "Creating ingress and dependencies",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.number(), Self::ALL.len(), self.label())
    }
}

/// Receives pipeline progress. All methods default to doing nothing.
pub trait ProgressReporter: Send + Sync {
    /// A step is about to run.
    fn step_started(&self, _step: Step) {}

    /// A step finished successfully.
    fn step_completed(&self, _step: Step) {}

    /// A step failed; the pipeline stops after this.
    fn step_failed(&self, _step: Step, _error: &DeployError) {}

    /// Resources that remain on the platform after a failure.
    fn resources_retained(&self, _resources: &[CreatedResource]) {}
}

/// Reporter that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {}
