//! CLI command implementations.
//!
//! - [`deploy`] - build, upload and deploy the current project; inspect
//!   deployments

pub mod deploy;

pub use deploy::DeployCommand;
