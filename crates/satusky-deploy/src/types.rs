//! Request and result types for the deploy pipeline.

use std::path::PathBuf;

use satusky_proto::{DeploymentId, EnvVar, IngressId, ServiceId};
use satusky_validation::{
    parse_env_pair, validate_cpu, validate_domain, validate_image_reference, validate_memory,
    validate_mount_path, validate_port, validate_storage_size,
};
use serde::{Deserialize, Serialize};

use crate::error::{DeployError, DeployResult};

/// Port used when none is given.
pub const DEFAULT_PORT: u16 = 8080;

/// CPU request given to every dependency.
pub const DEPENDENCY_CPU: &str = "100m";

/// Memory request given to every dependency.
pub const DEPENDENCY_MEMORY: &str = "128Mi";

/// A persistent volume to attach to a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSpec {
    /// Size such as `10Gi`.
    pub storage_size: String,
    /// Absolute mount path inside the container.
    pub mount_path: String,
}

impl VolumeSpec {
    /// Creates a volume spec.
    #[must_use]
    pub fn new(storage_size: impl Into<String>, mount_path: impl Into<String>) -> Self {
        Self {
            storage_size: storage_size.into(),
            mount_path: mount_path.into(),
        }
    }
}

/// Service exposed by a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyService {
    /// Port the dependency listens on.
    pub port: u16,
}

/// A sidecar deployed alongside the main application from a prebuilt image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    /// App label for the dependency, e.g. `redis`.
    pub name: String,
    /// Image reference to run.
    pub image: String,
    /// Service to create, if the dependency should be reachable.
    #[serde(default)]
    pub service: Option<DependencyService>,
    /// Volume to attach, if any.
    #[serde(default)]
    pub volume: Option<VolumeSpec>,
}

impl DependencySpec {
    /// Port for the dependency's deployment record.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.service.map_or(DEFAULT_PORT, |s| s.port)
    }

    fn validate(&self) -> DeployResult<()> {
        if self.name.trim().is_empty() {
            return Err(DeployError::preflight("dependency name cannot be empty"));
        }
        validate_image_reference(&self.image)?;
        if let Some(service) = self.service {
            validate_port(service.port)?;
        }
        if let Some(volume) = &self.volume {
            validate_storage_size(&volume.storage_size)?;
            validate_mount_path(&volume.mount_path)?;
        }
        Ok(())
    }
}

/// Everything the user asked for in `deploy create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    /// CPU quantity, e.g. `1` or `250m`.
    pub cpu: String,
    /// Memory quantity, e.g. `512Mi`.
    pub memory: String,
    /// Container port.
    pub port: u16,
    /// Explicit recipe path; discovery runs when absent or missing.
    pub dockerfile_path: Option<PathBuf>,
    /// Custom domain; generated when absent.
    pub domain: Option<String>,
    /// Target namespace; the session organization when absent.
    pub organization: Option<String>,
    /// Machines to pin the deployment to.
    pub hostnames: Vec<String>,
    /// Environment variables, in the order given.
    pub environment: Vec<EnvVar>,
    /// Persistent volume.
    pub volume: Option<VolumeSpec>,
    /// Sidecars, deployed in order.
    pub dependencies: Vec<DependencySpec>,
}

impl DeploymentRequest {
    /// Creates a request with the required quantities and defaults elsewhere.
    #[must_use]
    pub fn new(cpu: impl Into<String>, memory: impl Into<String>) -> Self {
        Self {
            cpu: cpu.into(),
            memory: memory.into(),
            port: DEFAULT_PORT,
            dockerfile_path: None,
            domain: None,
            organization: None,
            hostnames: Vec::new(),
            environment: Vec::new(),
            volume: None,
            dependencies: Vec::new(),
        }
    }

    /// Sets the container port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the recipe path.
    #[must_use]
    pub fn with_dockerfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.dockerfile_path = Some(path.into());
        self
    }

    /// Sets a custom domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the target namespace.
    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Pins the deployment to the given machines.
    #[must_use]
    pub fn with_hostnames<I, S>(mut self, hostnames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hostnames = hostnames.into_iter().map(Into::into).collect();
        self
    }

    /// Adds an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.push(EnvVar::new(key, value));
        self
    }

    /// Attaches a persistent volume.
    #[must_use]
    pub fn with_volume(mut self, volume: VolumeSpec) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Sets the dependency list.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<DependencySpec>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Whether an environment record will be created.
    #[must_use]
    pub fn env_enabled(&self) -> bool {
        !self.environment.is_empty()
    }

    /// Whether a volume record will be created.
    #[must_use]
    pub const fn volume_enabled(&self) -> bool {
        self.volume.is_some()
    }

    /// Checks every field that can be checked without a remote call.
    ///
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(&self) -> DeployResult<()> {
        validate_cpu(&self.cpu)?;
        validate_memory(&self.memory)?;
        validate_port(self.port)?;
        if let Some(domain) = &self.domain {
            validate_domain(domain)?;
        }
        if let Some(organization) = &self.organization {
            if organization.trim().is_empty() {
                return Err(DeployError::preflight("organization cannot be empty"));
            }
        }
        if let Some(name) = self.hostnames.iter().find(|name| name.trim().is_empty()) {
            return Err(DeployError::preflight(format!(
                "machine name '{name}' cannot be empty"
            )));
        }
        for var in &self.environment {
            parse_env_pair(&format!("{}={}", var.key, var.value))?;
        }
        if let Some(volume) = &self.volume {
            validate_storage_size(&volume.storage_size)?;
            validate_mount_path(&volume.mount_path)?;
        }
        for dependency in &self.dependencies {
            dependency.validate()?;
        }
        Ok(())
    }
}

/// Fixed fields stamped onto every deployment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployDefaults {
    /// Region code.
    pub region: String,
    /// Zone within the region.
    pub zone: String,
    /// Deployment `type` field.
    pub deployment_type: String,
    /// Deployment `environment` field.
    pub environment: String,
    /// SSD flag as the platform expects it.
    pub ssd: String,
    /// GPU flag as the platform expects it.
    pub gpu: String,
}

impl Default for DeployDefaults {
    fn default() -> Self {
        Self {
            region: "SG".to_string(),
            zone: "sg-sgp-1".to_string(),
            deployment_type: "production".to_string(),
            environment: "production".to_string(),
            ssd: "true".to_string(),
            gpu: "false".to_string(),
        }
    }
}

/// What was created for one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyOutcome {
    /// Dependency name.
    pub name: String,
    /// Its deployment.
    pub deployment_id: DeploymentId,
    /// Its service, if one was requested.
    pub service_id: Option<ServiceId>,
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployOutcome {
    /// The main deployment.
    pub deployment_id: DeploymentId,
    /// App label, equal to the project name.
    pub app_label: String,
    /// Public domain without scheme.
    pub domain: String,
    /// Fully qualified image reference that was deployed.
    pub image: String,
    /// Service in front of the deployment.
    pub service_id: ServiceId,
    /// Ingress binding the domain to the service.
    pub ingress_id: IngressId,
    /// Dependencies, in creation order.
    pub dependencies: Vec<DependencyOutcome>,
}

impl DeployOutcome {
    /// Public URL of the deployed app.
    #[must_use]
    pub fn url(&self) -> String {
        format!("https://{}", self.domain)
    }
}
