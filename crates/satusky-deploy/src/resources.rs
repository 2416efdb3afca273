//! Assembles resource records and creates them on the platform.

use satusky_proto::{
    Deployment, DeploymentId, DnsConfig, EnvVar, Environment, EnvironmentId, Ingress, IngressId,
    Service, ServiceId, UserId, Volume,
};

use crate::api::PlatformApi;
use crate::cleanup::{CleanupRegistry, CreatedResource};
use crate::error::DeployResult;
use crate::types::{DeployDefaults, VolumeSpec};

/// Fields of a deployment that vary per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentDraft {
    /// App label.
    pub app_label: String,
    /// Image reference.
    pub image: String,
    /// CPU request.
    pub cpu: String,
    /// Memory request, also used as the limit.
    pub memory: String,
    /// Container port.
    pub port: u16,
    /// Resolved machines.
    pub hostnames: Vec<String>,
    /// Whether an environment will follow.
    pub env_enabled: bool,
    /// Whether a volume will follow.
    pub volume_enabled: bool,
}

impl DeploymentDraft {
    /// Builds the full record. Replicas equal the number of hostnames.
    #[must_use]
    pub fn into_record(self, namespace: &str, user_id: UserId, defaults: &DeployDefaults) -> Deployment {
        Deployment {
            user_id,
            app_label: self.app_label,
            image: self.image,
            replicas: u32::try_from(self.hostnames.len()).unwrap_or(u32::MAX),
            hostnames: self.hostnames,
            cpu_request: self.cpu,
            memory_limit: self.memory.clone(),
            memory_request: self.memory,
            port: self.port,
            namespace: namespace.to_string(),
            region: defaults.region.clone(),
            zone: defaults.zone.clone(),
            deployment_type: defaults.deployment_type.clone(),
            environment: defaults.environment.clone(),
            ssd: defaults.ssd.clone(),
            gpu: defaults.gpu.clone(),
            env_enabled: self.env_enabled,
            volume_enabled: self.volume_enabled,
            ..Deployment::default()
        }
    }
}

/// Volume name for an app label.
#[must_use]
pub fn volume_name(app_label: &str) -> String {
    format!("{app_label}-volume")
}

/// Claim name for an app label.
#[must_use]
pub fn claim_name(app_label: &str) -> String {
    format!("{app_label}-claim")
}

/// Creates records in one namespace, logging each one in a
/// [`CleanupRegistry`].
#[derive(Debug)]
pub struct ResourceCreator<'a, P> {
    api: &'a P,
    namespace: &'a str,
    user_id: UserId,
    defaults: &'a DeployDefaults,
    registry: &'a CleanupRegistry,
}

impl<'a, P: PlatformApi> ResourceCreator<'a, P> {
    /// Creates a resource creator.
    #[must_use]
    pub const fn new(
        api: &'a P,
        namespace: &'a str,
        user_id: UserId,
        defaults: &'a DeployDefaults,
        registry: &'a CleanupRegistry,
    ) -> Self {
        Self {
            api,
            namespace,
            user_id,
            defaults,
            registry,
        }
    }

    /// Creates the deployment record.
    ///
    /// # Errors
    ///
    /// Returns the platform error.
    pub async fn create_deployment(&self, draft: DeploymentDraft) -> DeployResult<DeploymentId> {
        let record = draft.into_record(self.namespace, self.user_id, self.defaults);
        tracing::debug!(app_label = %record.app_label, replicas = record.replicas, "creating deployment");
        let id = self.api.create_deployment(&record).await?;
        self.registry.record(CreatedResource::Deployment {
            id,
            app_label: record.app_label,
        });
        Ok(id)
    }

    /// Creates a service named after the app label.
    ///
    /// # Errors
    ///
    /// Returns the platform error.
    pub async fn create_service(
        &self,
        deployment_id: DeploymentId,
        app_label: &str,
        port: u16,
    ) -> DeployResult<ServiceId> {
        let record = Service {
            deployment_id,
            namespace: self.namespace.to_string(),
            app_label: app_label.to_string(),
            service_name: app_label.to_string(),
            port,
            ..Service::default()
        };
        let id = self.api.create_service(&record).await?;
        self.registry.record(CreatedResource::Service {
            id,
            name: record.service_name,
        });
        Ok(id)
    }

    /// Creates the environment record.
    ///
    /// # Errors
    ///
    /// Returns the platform error.
    pub async fn create_environment(
        &self,
        deployment_id: DeploymentId,
        app_label: &str,
        variables: &[EnvVar],
    ) -> DeployResult<EnvironmentId> {
        let record = Environment {
            deployment_id,
            namespace: self.namespace.to_string(),
            app_label: app_label.to_string(),
            variables: variables.to_vec(),
            ..Environment::default()
        };
        let saved = self.api.create_environment(&record).await?;
        self.registry.record(CreatedResource::Environment {
            id: saved.environment_id,
            app_label: record.app_label,
        });
        Ok(saved.environment_id)
    }

    /// Creates a volume and claim named after the app label.
    ///
    /// # Errors
    ///
    /// Returns the platform error.
    pub async fn create_volume(
        &self,
        deployment_id: DeploymentId,
        app_label: &str,
        spec: &VolumeSpec,
    ) -> DeployResult<()> {
        let record = Volume {
            deployment_id,
            namespace: self.namespace.to_string(),
            app_label: app_label.to_string(),
            volume_name: volume_name(app_label),
            claim_name: claim_name(app_label),
            storage_size: spec.storage_size.clone(),
            mount_path: spec.mount_path.clone(),
            ..Volume::default()
        };
        self.api.create_volume(&record).await?;
        self.registry.record(CreatedResource::Volume {
            name: record.volume_name,
            claim: record.claim_name,
        });
        Ok(())
    }

    /// Creates an ingress with the default DNS mode.
    ///
    /// # Errors
    ///
    /// Returns the platform error.
    pub async fn create_ingress(
        &self,
        deployment_id: DeploymentId,
        service_id: ServiceId,
        app_label: &str,
        domain: &str,
        port: u16,
    ) -> DeployResult<IngressId> {
        let record = Ingress {
            deployment_id,
            service_id,
            namespace: self.namespace.to_string(),
            app_label: app_label.to_string(),
            domain_name: domain.to_string(),
            port,
            dns_config: DnsConfig::Default,
            ..Ingress::default()
        };
        let id = self.api.create_ingress(&record).await?;
        self.registry.record(CreatedResource::Ingress {
            id,
            domain: record.domain_name,
        });
        Ok(id)
    }
}
