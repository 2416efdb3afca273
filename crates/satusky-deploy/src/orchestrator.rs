//! The deploy pipeline.
//!
//! Five strictly ordered steps:
//!
//! 1. build the image and upload it
//! 2. select hosts and create the deployment
//! 3. create the service
//! 4. create the environment and volume, concurrently
//! 5. create the ingress and the dependencies, concurrently
//!
//! The first error stops the run. Resources created before it stay on the
//! platform and are reported through [`ProgressReporter::resources_retained`].

use std::future::Future;
use std::path::{Path, PathBuf};

use satusky_proto::{DeploymentId, ServiceId};

use crate::api::PlatformApi;
use crate::cleanup::CleanupRegistry;
use crate::domain::DomainAllocator;
use crate::error::{DeployError, DeployResult};
use crate::hosts::HostSelector;
use crate::progress::{ProgressReporter, Step};
use crate::resources::{DeploymentDraft, ResourceCreator};
use crate::session::SessionContext;
use crate::toolchain::{
    build_context, check_image_name, discover_recipe, ContainerToolchain, ImageArchive,
};
use crate::types::{
    DependencyOutcome, DependencySpec, DeployDefaults, DeployOutcome, DeploymentRequest,
    DEPENDENCY_CPU, DEPENDENCY_MEMORY,
};
use crate::uploader::ImageUploader;

/// Everything checked before the first remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Preflight {
    namespace: String,
    recipe: PathBuf,
    context: PathBuf,
}

/// Runs the deploy pipeline against a platform and a local toolchain.
#[derive(Debug)]
pub struct Orchestrator<P, T> {
    api: P,
    toolchain: T,
    session: SessionContext,
    working_dir: PathBuf,
    defaults: DeployDefaults,
    max_domain_attempts: Option<usize>,
}

async fn run_step<O>(
    progress: &dyn ProgressReporter,
    step: Step,
    work: impl Future<Output = DeployResult<O>>,
) -> DeployResult<O> {
    progress.step_started(step);
    match work.await {
        Ok(value) => {
            progress.step_completed(step);
            tracing::info!(step = step.number(), "{}", step.label());
            Ok(value)
        }
        Err(e) => {
            progress.step_failed(step, &e);
            Err(e)
        }
    }
}

impl<P: PlatformApi, T: ContainerToolchain> Orchestrator<P, T> {
    /// Creates an orchestrator building from `working_dir`.
    #[must_use]
    pub fn new(api: P, toolchain: T, session: SessionContext, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            toolchain,
            session,
            working_dir: working_dir.into(),
            defaults: DeployDefaults::default(),
            max_domain_attempts: None,
        }
    }

    /// Overrides the fixed deployment fields.
    #[must_use]
    pub fn with_defaults(mut self, defaults: DeployDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Bounds the number of domain lookups.
    #[must_use]
    pub const fn with_max_domain_attempts(mut self, attempts: usize) -> Self {
        self.max_domain_attempts = Some(attempts);
        self
    }

    /// The platform client.
    pub const fn api(&self) -> &P {
        &self.api
    }

    /// The session this orchestrator acts for.
    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    fn preflight(&self, request: &DeploymentRequest) -> DeployResult<Preflight> {
        self.session.require_credentials()?;
        request.validate()?;

        let namespace = request
            .organization
            .clone()
            .unwrap_or_else(|| self.session.organization.clone());
        if namespace.is_empty() {
            return Err(DeployError::preflight(
                "no organization selected: pass --organization or log in again",
            ));
        }

        let explicit = request.dockerfile_path.as_deref();
        let recipe = discover_recipe(&self.working_dir, explicit)?;
        let context = build_context(&recipe, explicit.is_some(), &self.working_dir);

        Ok(Preflight {
            namespace,
            recipe,
            context,
        })
    }

    /// Runs the full pipeline for `request`.
    ///
    /// # Errors
    ///
    /// Returns the first error from any step. Nothing created before it is
    /// rolled back.
    pub async fn deploy(
        &self,
        request: &DeploymentRequest,
        progress: &dyn ProgressReporter,
    ) -> DeployResult<DeployOutcome> {
        let preflight = self.preflight(request)?;
        let registry = CleanupRegistry::new();

        let result = self.run(request, &preflight, &registry, progress).await;
        if result.is_err() && !registry.is_empty() {
            let retained = registry.snapshot();
            for resource in &retained {
                tracing::warn!(namespace = %preflight.namespace, %resource, "left on platform after failure");
            }
            progress.resources_retained(&retained);
        }
        result
    }

    async fn run(
        &self,
        request: &DeploymentRequest,
        preflight: &Preflight,
        registry: &CleanupRegistry,
        progress: &dyn ProgressReporter,
    ) -> DeployResult<DeployOutcome> {
        let creator = ResourceCreator::new(
            &self.api,
            &preflight.namespace,
            self.session.user_id,
            &self.defaults,
            registry,
        );

        let (project, image) = run_step(
            progress,
            Step::BuildAndUpload,
            self.build_and_upload(&preflight.recipe, &preflight.context),
        )
        .await?;

        let deployment_id = run_step(progress, Step::CreateDeployment, async {
            let hostnames = HostSelector::new(&self.api, self.session.user_id)
                .select(&request.hostnames)
                .await?;
            creator
                .create_deployment(DeploymentDraft {
                    app_label: project.clone(),
                    image: image.clone(),
                    cpu: request.cpu.trim().to_string(),
                    memory: request.memory.trim().to_string(),
                    port: request.port,
                    hostnames,
                    env_enabled: request.env_enabled(),
                    volume_enabled: request.volume_enabled(),
                })
                .await
        })
        .await?;

        let service_id = run_step(
            progress,
            Step::CreateService,
            creator.create_service(deployment_id, &project, request.port),
        )
        .await?;

        run_step(progress, Step::EnvironmentAndVolume, async {
            let environment = async {
                if request.env_enabled() {
                    creator
                        .create_environment(deployment_id, &project, &request.environment)
                        .await?;
                }
                Ok::<_, DeployError>(())
            };
            let volume = async {
                if let Some(spec) = &request.volume {
                    creator.create_volume(deployment_id, &project, spec).await?;
                }
                Ok::<_, DeployError>(())
            };
            let (environment, volume) = tokio::join!(environment, volume);
            environment.and(volume)
        })
        .await?;

        let (domain, ingress_id, dependencies) = run_step(progress, Step::IngressAndDependencies, async {
            let ingress = async {
                let mut allocator = DomainAllocator::new(&self.api);
                if let Some(max) = self.max_domain_attempts {
                    allocator = allocator.with_max_attempts(max);
                }
                let domain = allocator.allocate(request.domain.as_deref(), &project).await?;
                let id = creator
                    .create_ingress(deployment_id, service_id, &project, &domain, request.port)
                    .await?;
                Ok::<_, DeployError>((domain, id))
            };
            let dependencies = self.create_dependencies(&creator, &request.dependencies);
            let (ingress, dependencies) = tokio::join!(ingress, dependencies);
            let (domain, id) = ingress?;
            Ok::<_, DeployError>((domain, id, dependencies?))
        })
        .await?;

        Ok(DeployOutcome {
            deployment_id,
            app_label: project,
            domain,
            image,
            service_id,
            ingress_id,
            dependencies,
        })
    }

    async fn build_and_upload(&self, recipe: &Path, context: &Path) -> DeployResult<(String, String)> {
        let project = self.toolchain.project_name(&self.working_dir).await?;
        check_image_name(&project)?;
        self.toolchain.build(recipe, context, &project).await?;

        let archive = ImageArchive::create(&project)?;
        self.toolchain.export(&project, &archive).await?;
        let image = ImageUploader::new(&self.api).upload(&archive, &project).await?;
        Ok((project, image))
    }

    async fn create_dependencies(
        &self,
        creator: &ResourceCreator<'_, P>,
        dependencies: &[DependencySpec],
    ) -> DeployResult<Vec<DependencyOutcome>> {
        let mut created = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            created.push(self.create_dependency(creator, dependency).await?);
        }
        Ok(created)
    }

    async fn create_dependency(
        &self,
        creator: &ResourceCreator<'_, P>,
        dependency: &DependencySpec,
    ) -> DeployResult<DependencyOutcome> {
        tracing::debug!(name = %dependency.name, image = %dependency.image, "creating dependency");
        let hostnames = HostSelector::new(&self.api, self.session.user_id)
            .select(&[])
            .await?;
        let deployment_id: DeploymentId = creator
            .create_deployment(DeploymentDraft {
                app_label: dependency.name.clone(),
                image: dependency.image.clone(),
                cpu: DEPENDENCY_CPU.to_string(),
                memory: DEPENDENCY_MEMORY.to_string(),
                port: dependency.port(),
                hostnames,
                env_enabled: false,
                volume_enabled: dependency.volume.is_some(),
            })
            .await?;

        let service_id: Option<ServiceId> = match dependency.service {
            Some(service) => Some(
                creator
                    .create_service(deployment_id, &dependency.name, service.port)
                    .await?,
            ),
            None => None,
        };

        if let Some(volume) = &dependency.volume {
            creator
                .create_volume(deployment_id, &dependency.name, volume)
                .await?;
        }

        Ok(DependencyOutcome {
            name: dependency.name.clone(),
            deployment_id,
            service_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::CreatedResource;
    use crate::error::ErrorCategory;
    use crate::fake::{FakePlatform, FakeToolchain};
    use crate::progress::NoopProgress;
    use crate::types::{DependencyService, VolumeSpec};
    use parking_lot::Mutex;
    use satusky_proto::UserId;
    use std::fs;
    use tempfile::TempDir;

    const RECIPE: &str = "FROM node:18-alpine\nCOPY . .\nCMD [\"node\", \"index.js\"]\n";

    struct Fixture {
        dir: TempDir,
        user: UserId,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join("Dockerfile"), RECIPE).unwrap();
            Self {
                dir,
                user: UserId::new(),
            }
        }

        fn session(&self) -> SessionContext {
            SessionContext::new("token", "acme", self.user, "config-key")
        }

        fn orchestrator(&self, api: FakePlatform) -> Orchestrator<FakePlatform, FakeToolchain> {
            Orchestrator::new(api, FakeToolchain::new("demo"), self.session(), self.dir.path())
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
        retained: Mutex<Vec<CreatedResource>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn step_started(&self, step: Step) {
            self.events.lock().push(format!("start {}", step.number()));
        }
        fn step_completed(&self, step: Step) {
            self.events.lock().push(format!("done {}", step.number()));
        }
        fn step_failed(&self, step: Step, _error: &DeployError) {
            self.events.lock().push(format!("fail {}", step.number()));
        }
        fn resources_retained(&self, resources: &[CreatedResource]) {
            self.retained.lock().extend_from_slice(resources);
        }
    }

    mod happy_path {
        use super::*;

        #[tokio::test]
        async fn deploys_with_defaults() {
            let fx = Fixture::new();
            let orchestrator = fx.orchestrator(FakePlatform::new());
            let progress = RecordingProgress::default();

            let outcome = orchestrator
                .deploy(&DeploymentRequest::new("1", "512Mi"), &progress)
                .await
                .unwrap();

            assert_eq!(outcome.app_label, "demo");
            assert_eq!(outcome.domain, "demo.satusky.com");
            assert!(outcome
                .image
                .starts_with("registry.satusky.com/satusky-container-registry/demo:"));

            let state = orchestrator.api().state();
            assert_eq!(state.deployments.len(), 1);
            let deployment = &state.deployments[0];
            assert_eq!(deployment.image, outcome.image);
            assert_eq!(deployment.namespace, "acme");
            assert_eq!(deployment.replicas, 0);
            assert_eq!(deployment.memory_limit, "512Mi");
            assert_eq!(state.services[0].deployment_id, outcome.deployment_id);
            assert_eq!(state.ingresses[0].deployment_id, outcome.deployment_id);
            assert_eq!(state.ingresses[0].domain_name, "demo.satusky.com");
            assert!(state.environments.is_empty());
            assert!(state.volumes.is_empty());

            let events = progress.events.lock().clone();
            assert_eq!(
                events,
                vec![
                    "start 1", "done 1", "start 2", "done 2", "start 3", "done 3", "start 4",
                    "done 4", "start 5", "done 5"
                ]
            );
        }

        #[tokio::test]
        async fn builds_from_working_dir_and_removes_archive() {
            let fx = Fixture::new();
            let orchestrator = fx.orchestrator(FakePlatform::new());
            orchestrator
                .deploy(&DeploymentRequest::new("1", "512Mi"), &NoopProgress)
                .await
                .unwrap();

            let builds = orchestrator.toolchain.builds();
            assert_eq!(builds.len(), 1);
            assert_eq!(builds[0].0, fx.dir.path().join("Dockerfile"));
            assert_eq!(builds[0].1, fx.dir.path());
            assert_eq!(builds[0].2, "demo");

            let exports = orchestrator.toolchain.exports();
            assert_eq!(exports.len(), 1);
            assert!(!exports[0].exists());
        }

        #[tokio::test]
        async fn dockerfile_directory_builds_from_that_directory() {
            let fx = Fixture::new();
            let api_dir = fx.dir.path().join("services/api");
            fs::create_dir_all(&api_dir).unwrap();
            fs::write(api_dir.join("Dockerfile"), RECIPE).unwrap();
            let orchestrator = fx.orchestrator(FakePlatform::new());

            let request = DeploymentRequest::new("1", "512Mi").with_dockerfile("services/api");
            orchestrator.deploy(&request, &NoopProgress).await.unwrap();

            let builds = orchestrator.toolchain.builds();
            assert_eq!(builds[0].0, api_dir.join("Dockerfile"));
            assert_eq!(builds[0].1, api_dir);
        }

        #[tokio::test]
        async fn missing_dockerfile_falls_back_to_its_directory_as_context() {
            let fx = Fixture::new();
            let api_dir = fx.dir.path().join("services/api");
            fs::create_dir_all(&api_dir).unwrap();
            fs::write(api_dir.join("Dockerfile"), RECIPE).unwrap();
            let orchestrator = fx.orchestrator(FakePlatform::new());

            let request =
                DeploymentRequest::new("1", "512Mi").with_dockerfile("services/api/Dockerfile.prod");
            orchestrator.deploy(&request, &NoopProgress).await.unwrap();

            let builds = orchestrator.toolchain.builds();
            assert_eq!(builds[0].0, api_dir.join("Dockerfile"));
            assert_eq!(builds[0].1, api_dir);
        }

        #[tokio::test]
        async fn creates_environment_and_volume() {
            let fx = Fixture::new();
            let orchestrator = fx.orchestrator(FakePlatform::new());
            let request = DeploymentRequest::new("500m", "1Gi")
                .with_env("NODE_ENV", "production")
                .with_volume(VolumeSpec::new("5Gi", "/data"));

            let outcome = orchestrator.deploy(&request, &NoopProgress).await.unwrap();

            let state = orchestrator.api().state();
            assert!(state.deployments[0].env_enabled);
            assert!(state.deployments[0].volume_enabled);
            assert_eq!(state.environments[0].deployment_id, outcome.deployment_id);
            assert_eq!(state.environments[0].app_label, "demo");
            assert_eq!(state.environments[0].namespace, "acme");
            assert_eq!(state.environments[0].variables[0].key, "NODE_ENV");
            assert_eq!(state.volumes[0].deployment_id, outcome.deployment_id);
            assert_eq!(state.volumes[0].mount_path, "/data");
        }

        #[tokio::test]
        async fn uses_requested_domain_and_organization() {
            let fx = Fixture::new();
            let orchestrator = fx.orchestrator(FakePlatform::new());
            let request = DeploymentRequest::new("1", "512Mi")
                .with_domain("app.example.com")
                .with_organization("other-org");

            let outcome = orchestrator.deploy(&request, &NoopProgress).await.unwrap();
            assert_eq!(outcome.domain, "app.example.com");
            assert_eq!(orchestrator.api().state().deployments[0].namespace, "other-org");
            assert!(orchestrator.api().domain_lookups().is_empty());
        }

        #[tokio::test]
        async fn pins_requested_machines() {
            let fx = Fixture::new();
            let api = FakePlatform::new()
                .with_machine("m1", fx.user)
                .with_machine("m2", fx.user);
            let orchestrator = fx.orchestrator(api);
            let request = DeploymentRequest::new("1", "512Mi").with_hostnames(["m1", "m2"]);

            orchestrator.deploy(&request, &NoopProgress).await.unwrap();

            let deployment = &orchestrator.api().state().deployments[0];
            assert_eq!(deployment.hostnames, vec!["m1", "m2"]);
            assert_eq!(deployment.replicas, 2);
        }

        #[tokio::test]
        async fn creates_dependencies_in_order() {
            let fx = Fixture::new();
            let orchestrator = fx.orchestrator(FakePlatform::new());
            let request = DeploymentRequest::new("1", "512Mi").with_dependencies(vec![
                DependencySpec {
                    name: "redis".to_string(),
                    image: "redis:7".to_string(),
                    service: Some(DependencyService { port: 6379 }),
                    volume: None,
                },
                DependencySpec {
                    name: "db".to_string(),
                    image: "postgres:16".to_string(),
                    service: None,
                    volume: Some(VolumeSpec::new("5Gi", "/var/lib/postgresql/data")),
                },
            ]);

            let outcome = orchestrator.deploy(&request, &NoopProgress).await.unwrap();

            assert_eq!(outcome.dependencies.len(), 2);
            assert_eq!(outcome.dependencies[0].name, "redis");
            assert!(outcome.dependencies[0].service_id.is_some());
            assert!(outcome.dependencies[1].service_id.is_none());

            let state = orchestrator.api().state();
            let redis = state.deployments.iter().find(|d| d.app_label == "redis").unwrap();
            assert_eq!(redis.cpu_request, "100m");
            assert_eq!(redis.memory_request, "128Mi");
            assert_eq!(redis.port, 6379);
            assert_eq!(redis.image, "redis:7");
            assert_eq!(state.services.len(), 2);
            assert_eq!(state.volumes[0].volume_name, "db-volume");
        }
    }

    mod failures {
        use super::*;

        #[tokio::test]
        async fn missing_credentials_fail_before_build() {
            let fx = Fixture::new();
            let orchestrator = Orchestrator::new(
                FakePlatform::new(),
                FakeToolchain::new("demo"),
                SessionContext::default(),
                fx.dir.path(),
            );
            let err = orchestrator
                .deploy(&DeploymentRequest::new("1", "512Mi"), &NoopProgress)
                .await
                .unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Preflight);
            assert!(orchestrator.toolchain.builds().is_empty());
        }

        #[tokio::test]
        async fn invalid_flags_fail_preflight() {
            let fx = Fixture::new();
            let orchestrator = fx.orchestrator(FakePlatform::new());
            let err = orchestrator
                .deploy(&DeploymentRequest::new("9m", "512Mi"), &NoopProgress)
                .await
                .unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Preflight);
            assert!(orchestrator.toolchain.builds().is_empty());
        }

        #[tokio::test]
        async fn missing_recipe_fails_preflight() {
            let dir = TempDir::new().unwrap();
            let orchestrator = Orchestrator::new(
                FakePlatform::new(),
                FakeToolchain::new("demo"),
                SessionContext::new("t", "acme", UserId::new(), "k"),
                dir.path(),
            );
            let err = orchestrator
                .deploy(&DeploymentRequest::new("1", "512Mi"), &NoopProgress)
                .await
                .unwrap_err();
            assert!(matches!(err, DeployError::NoRecipe { .. }));
        }

        #[tokio::test]
        async fn unauthorized_machine_creates_nothing() {
            let fx = Fixture::new();
            let api = FakePlatform::new().with_machine("m1", UserId::new());
            let orchestrator = fx.orchestrator(api);
            let progress = RecordingProgress::default();
            let request = DeploymentRequest::new("1", "512Mi").with_hostnames(["m1"]);

            let err = orchestrator.deploy(&request, &progress).await.unwrap_err();

            assert_eq!(err.to_string(), "machine m1 is not owned by you");
            assert!(orchestrator.api().state().deployments.is_empty());
            assert!(progress.events.lock().contains(&"fail 2".to_string()));
            assert!(progress.retained.lock().is_empty());
        }

        #[tokio::test]
        async fn build_failure_is_toolchain_error() {
            let fx = Fixture::new();
            let orchestrator = Orchestrator::new(
                FakePlatform::new(),
                FakeToolchain::new("demo").failing_build(),
                fx.session(),
                fx.dir.path(),
            );
            let err = orchestrator
                .deploy(&DeploymentRequest::new("1", "512Mi"), &NoopProgress)
                .await
                .unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Toolchain);
            assert!(orchestrator.api().uploads().is_empty());
        }

        #[tokio::test]
        async fn uppercase_project_name_fails_before_build() {
            let fx = Fixture::new();
            let orchestrator = Orchestrator::new(
                FakePlatform::new(),
                FakeToolchain::new("MyApp"),
                fx.session(),
                fx.dir.path(),
            );
            let progress = RecordingProgress::default();

            let err = orchestrator
                .deploy(&DeploymentRequest::new("1", "512Mi"), &progress)
                .await
                .unwrap_err();

            assert_eq!(err.category(), ErrorCategory::Preflight);
            assert!(err.to_string().contains("'MyApp'"));
            assert!(orchestrator.toolchain.builds().is_empty());
            assert!(orchestrator.api().uploads().is_empty());
            assert!(progress.events.lock().contains(&"fail 1".to_string()));
        }

        #[tokio::test]
        async fn upload_failure_stops_before_deployment() {
            let fx = Fixture::new();
            let orchestrator = fx.orchestrator(FakePlatform::new().fail_upload(502));
            let err = orchestrator
                .deploy(&DeploymentRequest::new("1", "512Mi"), &NoopProgress)
                .await
                .unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Upload);
            assert!(orchestrator.api().state().deployments.is_empty());
        }

        #[tokio::test]
        async fn mid_pipeline_failure_reports_retained_resources() {
            let fx = Fixture::new();
            let orchestrator = fx.orchestrator(FakePlatform::new().fail_service("service quota"));
            let progress = RecordingProgress::default();

            let err = orchestrator
                .deploy(&DeploymentRequest::new("1", "512Mi"), &progress)
                .await
                .unwrap_err();

            assert_eq!(err.to_string(), "service quota");
            let retained = progress.retained.lock().clone();
            assert_eq!(retained.len(), 1);
            assert!(matches!(retained[0], CreatedResource::Deployment { .. }));
            assert_eq!(orchestrator.api().state().deployments.len(), 1);
        }

        fn env_and_volume_request() -> DeploymentRequest {
            DeploymentRequest::new("1", "512Mi")
                .with_env("NODE_ENV", "production")
                .with_volume(VolumeSpec::new("5Gi", "/data"))
        }

        fn retained_labels(progress: &RecordingProgress) -> Vec<String> {
            progress.retained.lock().iter().map(ToString::to_string).collect()
        }

        #[tokio::test]
        async fn volume_failure_keeps_environment_and_reports_it() {
            let fx = Fixture::new();
            let orchestrator = fx.orchestrator(FakePlatform::new().fail_volume("volume quota"));
            let progress = RecordingProgress::default();

            let err = orchestrator
                .deploy(&env_and_volume_request(), &progress)
                .await
                .unwrap_err();

            assert_eq!(err.to_string(), "volume quota");
            assert_eq!(err.category(), ErrorCategory::Remote);
            assert!(progress.events.lock().contains(&"fail 4".to_string()));

            let state = orchestrator.api().state();
            assert_eq!(state.environments.len(), 1);
            assert!(state.volumes.is_empty());
            assert!(state.ingresses.is_empty());

            let retained = progress.retained.lock().clone();
            assert_eq!(retained.len(), 3);
            assert!(matches!(retained[0], CreatedResource::Deployment { .. }));
            assert!(matches!(retained[1], CreatedResource::Service { .. }));
            assert!(matches!(&retained[2], CreatedResource::Environment { app_label, .. } if app_label == "demo"));
        }

        #[tokio::test(start_paused = true)]
        async fn slower_environment_still_finishes_after_volume_fails() {
            let fx = Fixture::new();
            let api = FakePlatform::new()
                .fail_volume("volume quota")
                .slow_environment(std::time::Duration::from_secs(3));
            let orchestrator = fx.orchestrator(api);
            let progress = RecordingProgress::default();

            let err = orchestrator
                .deploy(&env_and_volume_request(), &progress)
                .await
                .unwrap_err();

            assert_eq!(err.to_string(), "volume quota");
            assert_eq!(orchestrator.api().state().environments.len(), 1);
            assert!(retained_labels(&progress)
                .iter()
                .any(|r| r.starts_with("environment for demo")));
        }

        #[tokio::test]
        async fn both_step_four_failures_surface_the_environment_error() {
            let fx = Fixture::new();
            let api = FakePlatform::new()
                .fail_environment("env rejected")
                .fail_volume("volume quota");
            let orchestrator = fx.orchestrator(api);

            let err = orchestrator
                .deploy(&env_and_volume_request(), &NoopProgress)
                .await
                .unwrap_err();

            assert_eq!(err.to_string(), "env rejected");
        }

        #[tokio::test]
        async fn ingress_failure_still_finishes_dependencies() {
            let fx = Fixture::new();
            let orchestrator = fx.orchestrator(FakePlatform::new().fail_ingress("domain conflict"));
            let progress = RecordingProgress::default();
            let request = DeploymentRequest::new("1", "512Mi").with_dependencies(vec![
                DependencySpec {
                    name: "redis".to_string(),
                    image: "redis:7".to_string(),
                    service: Some(DependencyService { port: 6379 }),
                    volume: None,
                },
                DependencySpec {
                    name: "db".to_string(),
                    image: "postgres:16".to_string(),
                    service: None,
                    volume: Some(VolumeSpec::new("5Gi", "/var/lib/postgresql/data")),
                },
            ]);

            let err = orchestrator.deploy(&request, &progress).await.unwrap_err();

            assert_eq!(err.to_string(), "domain conflict");
            assert!(progress.events.lock().contains(&"fail 5".to_string()));

            let state = orchestrator.api().state();
            assert_eq!(state.deployments.len(), 3);
            assert_eq!(state.services.len(), 2);
            assert_eq!(state.volumes.len(), 1);
            assert!(state.ingresses.is_empty());

            let retained = retained_labels(&progress);
            assert!(retained.iter().any(|r| r.starts_with("deployment redis")));
            assert!(retained.iter().any(|r| r.starts_with("service redis")));
            assert!(retained.iter().any(|r| r.starts_with("deployment db")));
            assert!(retained.iter().any(|r| r == "volume db-volume (claim db-claim)"));
            assert!(!retained.iter().any(|r| r.starts_with("ingress")));
        }

        #[tokio::test]
        async fn bounded_domain_allocation() {
            let fx = Fixture::new();
            let orchestrator = fx
                .orchestrator(FakePlatform::new().with_every_domain_taken())
                .with_max_domain_attempts(2);
            let err = orchestrator
                .deploy(&DeploymentRequest::new("1", "512Mi"), &NoopProgress)
                .await
                .unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Remote);
            assert!(orchestrator.api().state().ingresses.is_empty());
        }
    }
}
