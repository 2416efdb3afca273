//! Resource records created by the deploy pipeline.
//!
//! A deployment owns four kinds of satellite resources (service, ingress,
//! volume, environment). They share only `(namespace, deployment_id,
//! app_label)` and are kept as separate structs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DeploymentId, EnvironmentId, IngressId, ServiceId, UserId, VolumeId};

/// A deployment record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Deployment {
    /// Assigned by the platform on creation.
    #[serde(default)]
    pub deployment_id: DeploymentId,
    /// Owning user.
    #[serde(default)]
    pub user_id: UserId,
    /// Short human-readable name.
    pub app_label: String,
    /// Fully qualified image reference.
    pub image: String,
    /// Machines the replicas are pinned to.
    #[serde(default)]
    pub hostnames: Vec<String>,
    /// Replica count, one per hostname.
    #[serde(default)]
    pub replicas: u32,
    /// CPU request (`1`, `500m`, ...).
    pub cpu_request: String,
    /// Memory request (`512Mi`, ...).
    pub memory_request: String,
    /// Memory limit. Always equal to the request.
    pub memory_limit: String,
    /// Container port.
    pub port: u16,
    /// Target namespace.
    pub namespace: String,
    /// Region code.
    #[serde(default)]
    pub region: String,
    /// Zone code.
    #[serde(default)]
    pub zone: String,
    /// Deployment type (`production`).
    #[serde(rename = "type", default)]
    pub deployment_type: String,
    /// Environment tier (`production`).
    #[serde(default)]
    pub environment: String,
    /// SSD storage flag, sent as a string.
    #[serde(default)]
    pub ssd: String,
    /// GPU flag, sent as a string.
    #[serde(default)]
    pub gpu: String,
    /// Whether an environment record accompanies this deployment.
    #[serde(default)]
    pub env_enabled: bool,
    /// Whether a volume accompanies this deployment.
    #[serde(default)]
    pub volume_enabled: bool,
    /// Last status reported by the platform.
    #[serde(default)]
    pub status: String,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A service exposing a deployment's port inside the namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Service {
    /// Assigned by the platform on creation.
    #[serde(default)]
    pub service_id: ServiceId,
    /// Owning deployment.
    pub deployment_id: DeploymentId,
    /// Namespace.
    pub namespace: String,
    /// App label of the owning deployment.
    pub app_label: String,
    /// Service name.
    pub service_name: String,
    /// Service port.
    pub port: u16,
}

/// DNS handling for an ingress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsConfig {
    /// Platform-managed DNS.
    #[default]
    Default,
    /// DNS managed by the user.
    Custom,
}

/// Binds a public domain to a service port.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ingress {
    /// Assigned by the platform. Nil in "not found" lookups.
    #[serde(default)]
    pub ingress_id: IngressId,
    /// Owning deployment.
    #[serde(default)]
    pub deployment_id: DeploymentId,
    /// Target service.
    #[serde(default)]
    pub service_id: ServiceId,
    /// Namespace.
    #[serde(default)]
    pub namespace: String,
    /// App label of the owning deployment.
    #[serde(default)]
    pub app_label: String,
    /// Public domain name.
    #[serde(default)]
    pub domain_name: String,
    /// Target port.
    #[serde(default)]
    pub port: u16,
    /// DNS mode.
    #[serde(default)]
    pub dns_config: DnsConfig,
}

impl Ingress {
    /// Returns true when this is the "no ingress" sentinel returned by
    /// domain lookups.
    #[must_use]
    pub const fn is_sentinel(&self) -> bool {
        self.ingress_id.is_nil()
    }
}

/// A persistent volume claim mounted into a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Volume {
    /// Assigned by the platform.
    #[serde(default)]
    pub volume_id: VolumeId,
    /// Owning deployment.
    pub deployment_id: DeploymentId,
    /// Namespace.
    pub namespace: String,
    /// App label of the owning deployment.
    pub app_label: String,
    /// Volume name (`<project>-volume`).
    pub volume_name: String,
    /// Claim name (`<project>-claim`).
    pub claim_name: String,
    /// Requested size (`1Gi`).
    pub storage_size: String,
    /// Mount path inside the container.
    pub mount_path: String,
}

/// A single environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name.
    pub key: String,
    /// Variable value.
    pub value: String,
}

impl EnvVar {
    /// Creates a new variable.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Environment variables attached to a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Environment {
    /// Assigned by the platform.
    #[serde(default)]
    pub environment_id: EnvironmentId,
    /// Owning deployment.
    pub deployment_id: DeploymentId,
    /// Namespace.
    pub namespace: String,
    /// App label of the owning deployment.
    pub app_label: String,
    /// Variables, in the order given on the command line.
    #[serde(default)]
    pub variables: Vec<EnvVar>,
}
