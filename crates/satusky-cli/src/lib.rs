//! # satusky-cli
//!
//! Satusky command-line interface.
//!
//! Provides the `deploy` verbs:
//! - `create` builds the current project, uploads the image and wires up
//!   the deployment, service, environment, volume, ingress and dependencies
//! - `status`, `list` and `get` inspect what is running
//!
//! # Architecture
//!
//! The CLI talks to the platform over HTTPS. [`client::ApiClient`]
//! implements the orchestrator's `PlatformApi` seam and decodes each
//! endpoint's envelope into its typed payload.
//!
//! ```text
//! ┌─────────────┐   build / save   ┌────────────┐
//! │ satusky-cli │─────────────────►│   docker   │
//! │             │                  └────────────┘
//! │             │   REST + upload  ┌────────────┐
//! │             │─────────────────►│  platform  │
//! └─────────────┘                  └────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod commands;
pub mod error;
pub mod output;
pub mod progress;

pub use cli::{Cli, Commands, CreateArgs, DeployCommands, Format};
pub use client::ApiClient;
pub use error::CliError;
pub use output::OutputFormat;
pub use progress::TerminalProgress;
