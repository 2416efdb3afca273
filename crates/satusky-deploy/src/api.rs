//! The remote operations the pipeline depends on.
//!
//! The CLI implements [`PlatformApi`] over HTTP; tests use in-memory fakes.

use std::future::Future;
use std::path::Path;

use satusky_proto::{
    Deployment, DeploymentId, Environment, Ingress, IngressId, Machine, ServiceId, Service,
    StatusReport, UserId, Volume,
};

use crate::error::DeployResult;

/// Remote platform API used by the deploy pipeline.
///
/// Every method maps to one endpoint. Implementations never retry; the
/// first error is returned as is.
pub trait PlatformApi: Send + Sync {
    /// `POST /docker/images/upload` with `image`, `tag` and `version` parts.
    fn upload_image(
        &self,
        archive: &Path,
        tag: &str,
        version: &str,
    ) -> impl Future<Output = DeployResult<()>> + Send;

    /// `GET /machines/ownerId/{uuid}`.
    fn machines_by_owner(
        &self,
        owner: UserId,
    ) -> impl Future<Output = DeployResult<Vec<Machine>>> + Send;

    /// `GET /machines/name/{name}`.
    fn machine_by_name(&self, name: &str) -> impl Future<Output = DeployResult<Machine>> + Send;

    /// `GET /ingresses/domainName/{fqdn}`; `None` when the platform answers
    /// with the zero-id sentinel.
    fn ingress_by_domain(
        &self,
        domain: &str,
    ) -> impl Future<Output = DeployResult<Option<Ingress>>> + Send;

    /// `POST /deployments/upsert/{ns}/{label}`.
    fn create_deployment(
        &self,
        deployment: &Deployment,
    ) -> impl Future<Output = DeployResult<DeploymentId>> + Send;

    /// `POST /services/upsert/{ns}/{name}`.
    fn create_service(
        &self,
        service: &Service,
    ) -> impl Future<Output = DeployResult<ServiceId>> + Send;

    /// `POST /ingresses/upsert/{ns}/{label}`.
    fn create_ingress(
        &self,
        ingress: &Ingress,
    ) -> impl Future<Output = DeployResult<IngressId>> + Send;

    /// `POST /volumes/create`.
    fn create_volume(&self, volume: &Volume) -> impl Future<Output = DeployResult<()>> + Send;

    /// `POST /environments/upsert`; returns the saved record.
    fn create_environment(
        &self,
        environment: &Environment,
    ) -> impl Future<Output = DeployResult<Environment>> + Send;

    /// `GET /deployments/status/{uuid}`.
    fn deployment_status(
        &self,
        id: DeploymentId,
    ) -> impl Future<Output = DeployResult<StatusReport>> + Send;

    /// `GET /deployments/namespace/{ns}`.
    fn list_deployments(
        &self,
        namespace: &str,
    ) -> impl Future<Output = DeployResult<Vec<Deployment>>> + Send;

    /// `GET /deployments/{uuid}`.
    fn get_deployment(
        &self,
        id: DeploymentId,
    ) -> impl Future<Output = DeployResult<Deployment>> + Send;
}
