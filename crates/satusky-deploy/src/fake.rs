//! In-memory platform and toolchain used by unit tests.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use satusky_proto::{
    Deployment, DeploymentId, Environment, EnvironmentId, Ingress, IngressId, Machine, MachineId,
    Service, ServiceId, StatusReport, UserId, Volume,
};

use crate::api::PlatformApi;
use crate::error::{DeployError, DeployResult};
use crate::toolchain::{ContainerToolchain, ImageArchive};

#[derive(Debug, Clone)]
pub struct UploadCall {
    pub file_name: String,
    pub tag: String,
    pub version: String,
}

#[derive(Debug, Clone, Default)]
pub struct FakeState {
    pub uploads: Vec<UploadCall>,
    pub domain_lookups: Vec<String>,
    pub deployments: Vec<Deployment>,
    pub services: Vec<Service>,
    pub ingresses: Vec<Ingress>,
    pub volumes: Vec<Volume>,
    pub environments: Vec<Environment>,
}

#[derive(Debug, Default)]
pub struct FakePlatform {
    machines: Vec<Machine>,
    taken_domains: HashSet<String>,
    every_domain_taken: bool,
    upload_failure: Option<u16>,
    service_failure: Option<String>,
    environment_failure: Option<String>,
    volume_failure: Option<String>,
    ingress_failure: Option<String>,
    environment_delay: Option<Duration>,
    statuses: Mutex<VecDeque<StatusReport>>,
    state: Mutex<FakeState>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_machine(mut self, name: &str, owner: UserId) -> Self {
        self.machines.push(Machine {
            machine_id: MachineId::new(),
            machine_name: name.to_string(),
            owner_id: owner,
            ..Machine::default()
        });
        self
    }

    pub fn with_taken_domain(mut self, domain: &str) -> Self {
        self.taken_domains.insert(domain.to_string());
        self
    }

    pub fn with_every_domain_taken(mut self) -> Self {
        self.every_domain_taken = true;
        self
    }

    pub fn fail_upload(mut self, status: u16) -> Self {
        self.upload_failure = Some(status);
        self
    }

    pub fn fail_service(mut self, message: &str) -> Self {
        self.service_failure = Some(message.to_string());
        self
    }

    pub fn fail_environment(mut self, message: &str) -> Self {
        self.environment_failure = Some(message.to_string());
        self
    }

    pub fn fail_volume(mut self, message: &str) -> Self {
        self.volume_failure = Some(message.to_string());
        self
    }

    pub fn fail_ingress(mut self, message: &str) -> Self {
        self.ingress_failure = Some(message.to_string());
        self
    }

    /// Makes environment creation finish after `delay`.
    pub fn slow_environment(mut self, delay: Duration) -> Self {
        self.environment_delay = Some(delay);
        self
    }

    /// Statuses are returned in order; the last one repeats.
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = StatusReport>) -> Self {
        *self.statuses.lock() = statuses.into_iter().collect();
        self
    }

    pub fn state(&self) -> FakeState {
        self.state.lock().clone()
    }

    pub fn uploads(&self) -> Vec<UploadCall> {
        self.state.lock().uploads.clone()
    }

    pub fn domain_lookups(&self) -> Vec<String> {
        self.state.lock().domain_lookups.clone()
    }
}

impl PlatformApi for FakePlatform {
    async fn upload_image(&self, archive: &Path, tag: &str, version: &str) -> DeployResult<()> {
        if let Some(status) = self.upload_failure {
            return Err(DeployError::upload(Some(status), "registry unavailable"));
        }
        self.state.lock().uploads.push(UploadCall {
            file_name: archive
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            tag: tag.to_string(),
            version: version.to_string(),
        });
        Ok(())
    }

    async fn machines_by_owner(&self, owner: UserId) -> DeployResult<Vec<Machine>> {
        Ok(self
            .machines
            .iter()
            .filter(|m| m.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn machine_by_name(&self, name: &str) -> DeployResult<Machine> {
        self.machines
            .iter()
            .find(|m| m.machine_name == name)
            .cloned()
            .ok_or_else(|| DeployError::remote(Some(404), format!("machine {name} not found")))
    }

    async fn ingress_by_domain(&self, domain: &str) -> DeployResult<Option<Ingress>> {
        self.state.lock().domain_lookups.push(domain.to_string());
        if self.every_domain_taken || self.taken_domains.contains(domain) {
            return Ok(Some(Ingress {
                ingress_id: IngressId::new(),
                domain_name: domain.to_string(),
                ..Ingress::default()
            }));
        }
        Ok(None)
    }

    async fn create_deployment(&self, deployment: &Deployment) -> DeployResult<DeploymentId> {
        let id = DeploymentId::new();
        let mut saved = deployment.clone();
        saved.deployment_id = id;
        self.state.lock().deployments.push(saved);
        Ok(id)
    }

    async fn create_service(&self, service: &Service) -> DeployResult<ServiceId> {
        if let Some(message) = &self.service_failure {
            return Err(DeployError::remote(Some(500), message.clone()));
        }
        let id = ServiceId::new();
        let mut saved = service.clone();
        saved.service_id = id;
        self.state.lock().services.push(saved);
        Ok(id)
    }

    async fn create_ingress(&self, ingress: &Ingress) -> DeployResult<IngressId> {
        if let Some(message) = &self.ingress_failure {
            return Err(DeployError::remote(Some(409), message.clone()));
        }
        let id = IngressId::new();
        let mut saved = ingress.clone();
        saved.ingress_id = id;
        self.state.lock().ingresses.push(saved);
        Ok(id)
    }

    async fn create_volume(&self, volume: &Volume) -> DeployResult<()> {
        if let Some(message) = &self.volume_failure {
            return Err(DeployError::remote(Some(500), message.clone()));
        }
        self.state.lock().volumes.push(volume.clone());
        Ok(())
    }

    async fn create_environment(&self, environment: &Environment) -> DeployResult<Environment> {
        if let Some(delay) = self.environment_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.environment_failure {
            return Err(DeployError::remote(Some(500), message.clone()));
        }
        let mut saved = environment.clone();
        saved.environment_id = EnvironmentId::new();
        self.state.lock().environments.push(saved.clone());
        Ok(saved)
    }

    async fn deployment_status(&self, _id: DeploymentId) -> DeployResult<StatusReport> {
        let mut statuses = self.statuses.lock();
        let next = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        next.ok_or_else(|| DeployError::protocol("no status configured"))
    }

    async fn list_deployments(&self, namespace: &str) -> DeployResult<Vec<Deployment>> {
        Ok(self
            .state
            .lock()
            .deployments
            .iter()
            .filter(|d| d.namespace == namespace)
            .cloned()
            .collect())
    }

    async fn get_deployment(&self, id: DeploymentId) -> DeployResult<Deployment> {
        self.state
            .lock()
            .deployments
            .iter()
            .find(|d| d.deployment_id == id)
            .cloned()
            .ok_or_else(|| DeployError::remote(Some(404), "deployment not found"))
    }
}

#[derive(Debug, Default)]
pub struct FakeToolchain {
    project: String,
    fail_build: bool,
    builds: Mutex<Vec<(PathBuf, PathBuf, String)>>,
    exports: Mutex<Vec<PathBuf>>,
}

impl FakeToolchain {
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            ..Self::default()
        }
    }

    pub fn failing_build(mut self) -> Self {
        self.fail_build = true;
        self
    }

    pub fn builds(&self) -> Vec<(PathBuf, PathBuf, String)> {
        self.builds.lock().clone()
    }

    pub fn exports(&self) -> Vec<PathBuf> {
        self.exports.lock().clone()
    }
}

impl ContainerToolchain for FakeToolchain {
    async fn project_name(&self, _working_dir: &Path) -> DeployResult<String> {
        Ok(self.project.clone())
    }

    async fn build(&self, recipe: &Path, context: &Path, tag: &str) -> DeployResult<()> {
        if self.fail_build {
            return Err(DeployError::Toolchain(
                satusky_validation::CommandError::non_zero_exit("docker build", 1, "build failed"),
            ));
        }
        self.builds
            .lock()
            .push((recipe.to_path_buf(), context.to_path_buf(), tag.to_string()));
        Ok(())
    }

    async fn export(&self, _tag: &str, archive: &ImageArchive) -> DeployResult<()> {
        std::fs::write(archive.path(), b"fake image")?;
        self.exports.lock().push(archive.path().to_path_buf());
        Ok(())
    }
}
