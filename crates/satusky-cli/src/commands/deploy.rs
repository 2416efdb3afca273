//! `deploy` command implementation.
//!
//! - `create` runs the full build, upload and resource pipeline
//! - `status` fetches the current status, or polls until it settles
//! - `list` and `get` show deployment records

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use satusky_deploy::{
    ContainerToolchain, DependencySpec, DeploymentRequest, DockerToolchain, NoopProgress,
    Orchestrator, PlatformApi, ProgressReporter, SessionContext, StatusWaiter, VolumeSpec,
};
use satusky_proto::DeploymentId;
use satusky_validation::{parse_env_pair, validate_timeout, validate_volume_flags};
use tracing::debug;

use crate::cli::{CreateArgs, DeployCommands};
use crate::client::ApiClient;
use crate::error::CliError;
use crate::output::{
    write_status_line, DeploySummary, DeploymentDetail, DeploymentList, OutputFormat, StatusView,
};
use crate::progress::TerminalProgress;

/// Lookups the domain allocator may spend before asking for `--domain`.
pub const MAX_DOMAIN_ATTEMPTS: usize = 32;

/// Deploy command executor.
pub struct DeployCommand<P, T> {
    orchestrator: Orchestrator<P, T>,
    progress: Box<dyn ProgressReporter>,
}

impl<P, T> std::fmt::Debug for DeployCommand<P, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployCommand").finish_non_exhaustive()
    }
}

impl DeployCommand<ApiClient, DockerToolchain> {
    /// Deploy command for the real platform, acting for the saved session
    /// and building from the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file is unreadable, the API URL is
    /// invalid, or the working directory cannot be determined.
    pub fn connect(api_url: &str) -> Result<Self, CliError> {
        let session = SessionContext::load_default()?;
        let api = ApiClient::new(api_url, session.clone())?;
        let working_dir = std::env::current_dir()?;
        Ok(Self::new(api, DockerToolchain::new(), session, working_dir)
            .with_progress(Box::new(TerminalProgress::stderr())))
    }
}

impl<P: PlatformApi, T: ContainerToolchain> DeployCommand<P, T> {
    /// Create a deploy command over any platform and toolchain.
    #[must_use]
    pub fn new(api: P, toolchain: T, session: SessionContext, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            orchestrator: Orchestrator::new(api, toolchain, session, working_dir)
                .with_max_domain_attempts(MAX_DOMAIN_ATTEMPTS),
            progress: Box::new(NoopProgress),
        }
    }

    /// Report pipeline steps somewhere other than nowhere.
    #[must_use]
    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// The platform this command talks to.
    pub const fn api(&self) -> &P {
        self.orchestrator.api()
    }

    /// Execute a deploy subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if validation, a platform call, or output fails.
    pub async fn execute<W: Write + Send>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &DeployCommands,
    ) -> Result<(), CliError> {
        match command {
            DeployCommands::Create(args) => self.create(writer, format, args).await,
            DeployCommands::Status {
                deployment_id,
                watch,
                timeout,
            } => self.status(writer, format, deployment_id, *watch, *timeout).await,
            DeployCommands::List { namespace } => self.list(writer, format, namespace.as_deref()).await,
            DeployCommands::Get { deployment_id } => self.get(writer, format, deployment_id).await,
        }
    }

    async fn create<W: Write>(&self, writer: &mut W, format: &OutputFormat, args: &CreateArgs) -> Result<(), CliError> {
        let request = build_request(args)?;
        debug!(
            cpu = %request.cpu,
            memory = %request.memory,
            machines = request.hostnames.len(),
            dependencies = request.dependencies.len(),
            "deploy create"
        );
        let outcome = self.orchestrator.deploy(&request, self.progress.as_ref()).await?;
        format.write(writer, &DeploySummary::from(outcome))
    }

    async fn status<W: Write + Send>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        deployment_id: &str,
        watch: bool,
        timeout: u64,
    ) -> Result<(), CliError> {
        self.orchestrator.session().require_credentials()?;
        let id = parse_deployment_id(deployment_id)?;
        let api = self.orchestrator.api();

        let report = if watch {
            let timeout = Duration::from_secs(validate_timeout(timeout)?.value());
            let quiet = format.is_json();
            StatusWaiter::new(api)
                .wait(id, timeout, |report| {
                    if !quiet && write_status_line(writer, report).is_err() {
                        debug!("status line could not be written");
                    }
                })
                .await?
        } else {
            api.deployment_status(id).await?
        };

        format.write(
            writer,
            &StatusView {
                deployment_id: id,
                report,
            },
        )
    }

    async fn list<W: Write>(&self, writer: &mut W, format: &OutputFormat, namespace: Option<&str>) -> Result<(), CliError> {
        let session = self.orchestrator.session();
        session.require_credentials()?;
        let namespace = namespace.map_or_else(|| session.organization.clone(), str::to_string);
        if namespace.trim().is_empty() {
            return Err(CliError::InvalidArgument(
                "no namespace selected: pass --namespace or log in again".into(),
            ));
        }

        let deployments = self.orchestrator.api().list_deployments(&namespace).await?;
        format.write(
            writer,
            &DeploymentList {
                namespace,
                deployments,
            },
        )
    }

    async fn get<W: Write>(&self, writer: &mut W, format: &OutputFormat, deployment_id: &str) -> Result<(), CliError> {
        self.orchestrator.session().require_credentials()?;
        let id = parse_deployment_id(deployment_id)?;
        let deployment = self.orchestrator.api().get_deployment(id).await?;
        format.write(writer, &DeploymentDetail(deployment))
    }
}

fn parse_deployment_id(raw: &str) -> Result<DeploymentId, CliError> {
    DeploymentId::parse(raw).map_err(|e| CliError::InvalidArgument(e.to_string()))
}

/// Turns `deploy create` flags into a request.
///
/// # Errors
///
/// Returns an error for a malformed `--env` pair, an unpaired volume flag,
/// or an unreadable dependencies file. Quantities and names are checked by
/// the orchestrator's preflight.
pub fn build_request(args: &CreateArgs) -> Result<DeploymentRequest, CliError> {
    let mut request = DeploymentRequest::new(&args.cpu, &args.memory)
        .with_port(args.port)
        .with_hostnames(&args.machines);

    if let Some(domain) = &args.domain {
        request = request.with_domain(domain);
    }
    if let Some(organization) = &args.organization {
        request = request.with_organization(organization);
    }
    if let Some(dockerfile) = &args.dockerfile {
        request = request.with_dockerfile(dockerfile);
    }
    for pair in &args.env {
        let (key, value) = parse_env_pair(pair)?;
        request = request.with_env(key.into_inner(), value);
    }
    if let Some((size, mount)) = validate_volume_flags(args.volume_size.as_deref(), args.volume_mount.as_deref())? {
        request = request.with_volume(VolumeSpec::new(size.into_inner(), mount.into_inner()));
    }
    if let Some(path) = &args.dependencies {
        request = request.with_dependencies(load_dependencies(path)?);
    }
    Ok(request)
}

/// Reads a JSON array of dependency specs.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_dependencies(path: &Path) -> Result<Vec<DependencySpec>, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        CliError::InvalidArgument(format!("cannot read dependencies file {}: {e}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        CliError::InvalidArgument(format!("invalid dependencies file {}: {e}", path.display()))
    })
}
