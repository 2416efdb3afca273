//! # satusky-deploy
//!
//! The deploy pipeline behind `satusky deploy create`.
//!
//! Given a project directory and a [`DeploymentRequest`], the
//! [`Orchestrator`] builds and uploads a container image, then creates the
//! deployment, service, environment, volume, ingress and dependencies on
//! the platform in a fixed order. [`StatusWaiter`] polls a deployment until
//! it completes or fails.
//!
//! The platform is reached through the [`PlatformApi`] trait and the local
//! build tool through [`ContainerToolchain`], so both can be replaced in
//! tests.
//!
//! ## Modules
//!
//! - [`api`]: remote operations the pipeline needs
//! - [`toolchain`]: recipe discovery and validation, docker build/export
//! - [`uploader`]: image upload and registry references
//! - [`hosts`]: machine selection
//! - [`domain`]: public domain allocation
//! - [`resources`]: record assembly and creation
//! - [`orchestrator`]: the five-step pipeline
//! - [`waiter`]: status polling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod cleanup;
pub mod domain;
pub mod error;
pub mod hosts;
pub mod orchestrator;
pub mod progress;
pub mod resources;
pub mod session;
pub mod toolchain;
pub mod types;
pub mod uploader;
pub mod waiter;

#[cfg(test)]
mod fake;

pub use api::PlatformApi;
pub use cleanup::{CleanupRegistry, CreatedResource};
pub use domain::{DomainAllocator, DOMAIN_SUFFIX};
pub use error::{DeployError, DeployResult, ErrorCategory};
pub use hosts::HostSelector;
pub use orchestrator::Orchestrator;
pub use progress::{NoopProgress, ProgressReporter, Step};
pub use resources::{DeploymentDraft, ResourceCreator};
pub use session::SessionContext;
pub use toolchain::{ContainerToolchain, DockerToolchain, ImageArchive};
pub use types::{
    DependencyOutcome, DependencyService, DependencySpec, DeployDefaults, DeployOutcome,
    DeploymentRequest, VolumeSpec, DEFAULT_PORT,
};
pub use uploader::{ImageUploader, REGISTRY};
pub use waiter::{StatusWaiter, DEFAULT_WAIT_TIMEOUT, POLL_INTERVAL};
