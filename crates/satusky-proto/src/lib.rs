//! # satusky-proto
//!
//! Wire types for the Satusky platform API.
//!
//! Every response from the platform is wrapped in an [`ApiEnvelope`]; callers
//! decode straight into the typed payload for the endpoint instead of going
//! through an untyped `data` value first.
//!
//! ```rust
//! use satusky_proto::{ApiEnvelope, DeploymentId};
//!
//! let body = r#"{"error":false,"message":"ok","count":1,
//!     "data":"4f0d7a4e-8f0e-4c43-9a43-5bd1e7f6b3a1"}"#;
//! let envelope: ApiEnvelope<DeploymentId> = serde_json::from_str(body).unwrap();
//! assert!(envelope.into_data().is_ok());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod error;
pub mod machine;
pub mod quota;
pub mod resources;
pub mod status;
pub mod types;

pub use envelope::{error_message, ApiEnvelope};
pub use error::ProtoError;
pub use machine::Machine;
pub use quota::{QuotaErrorBody, ResourceExhausted, RESOURCE_EXHAUSTED_CODE};
pub use resources::{Deployment, DnsConfig, EnvVar, Environment, Ingress, Service, Volume};
pub use status::{DeploymentPhase, StatusReport};
pub use types::{
    DeploymentId, EnvironmentId, IngressId, MachineId, ServiceId, UserId, VolumeId,
};
