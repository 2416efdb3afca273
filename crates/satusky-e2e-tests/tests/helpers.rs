//! Test helpers for E2E tests.
//!
//! [`StubPlatform`] answers every call with a JSON envelope and passes it
//! through the CLI client's decoders, so the pipeline sees exactly what it
//! would see over HTTP.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use clap::Parser;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;

use satusky_cli::cli::{Cli, Commands, DeployCommands, Format};
use satusky_cli::client::{check_status, decode, decode_ingress_id, decode_ingress_lookup};
use satusky_cli::commands::DeployCommand;
use satusky_cli::output::OutputFormat;
use satusky_cli::CliError;
use satusky_deploy::{
    ContainerToolchain, DeployResult, ImageArchive, PlatformApi, SessionContext,
};
use satusky_proto::{
    Deployment, DeploymentId, Environment, EnvironmentId, Ingress, IngressId, Machine, MachineId,
    Service, ServiceId, StatusReport, UserId, Volume,
};

/// Project name every stub build resolves to.
pub const PROJECT: &str = "demo";

/// One image upload as the registry saw it.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub tag: String,
    pub version: String,
    pub size: u64,
}

/// Everything the stub platform was asked to do.
#[derive(Debug, Clone, Default)]
pub struct Calls {
    pub uploads: Vec<Upload>,
    pub owner_lookups: Vec<UserId>,
    pub machine_lookups: Vec<String>,
    pub domain_lookups: Vec<String>,
    pub deployments: Vec<Deployment>,
    pub services: Vec<Service>,
    pub environments: Vec<Environment>,
    pub volumes: Vec<Volume>,
    pub ingresses: Vec<Ingress>,
    pub status_polls: usize,
}

/// A canned HTTP answer.
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: u16,
    pub body: String,
}

/// In-memory platform speaking the wire format.
#[derive(Debug, Default)]
pub struct StubPlatform {
    machines: HashMap<String, Machine>,
    taken_domains: HashSet<String>,
    deployment_answer: Option<Canned>,
    statuses: Mutex<VecDeque<(String, u8)>>,
    calls: Mutex<Calls>,
}

fn ok<T: Serialize>(data: &T) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "error": false,
        "message": "ok",
        "count": null,
        "data": data,
    }))
    .unwrap()
}

fn not_found(message: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({ "error": true, "message": message, "data": null })).unwrap()
}

impl StubPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a machine owned by `owner`.
    pub fn with_machine(mut self, name: &str, owner: UserId) -> Self {
        self.machines.insert(
            name.to_string(),
            Machine {
                machine_id: MachineId::new(),
                machine_name: name.to_string(),
                owner_id: owner,
                machine_region: "SG".into(),
                machine_zone: "sg-sgp-1".into(),
                cpu_cores: 8,
                memory_gb: 32,
                ..Machine::default()
            },
        );
        self
    }

    /// Makes `domain` resolve to an existing ingress.
    pub fn with_taken_domain(mut self, domain: &str) -> Self {
        self.taken_domains.insert(domain.to_string());
        self
    }

    /// Answers `CreateDeployment` with a fixed response.
    pub fn answer_deployment(mut self, status: u16, body: &str) -> Self {
        self.deployment_answer = Some(Canned {
            status,
            body: body.to_string(),
        });
        self
    }

    /// Status values returned by successive polls; the last one repeats.
    pub fn with_statuses(self, statuses: &[(&str, u8)]) -> Self {
        *self.statuses.lock() = statuses.iter().map(|(s, p)| ((*s).to_string(), *p)).collect();
        self
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().clone()
    }
}

impl PlatformApi for StubPlatform {
    async fn upload_image(&self, archive: &Path, tag: &str, version: &str) -> DeployResult<()> {
        let size = std::fs::metadata(archive)?.len();
        let file_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.calls.lock().uploads.push(Upload {
            file_name,
            tag: tag.to_string(),
            version: version.to_string(),
            size,
        });
        check_status(200, b"")
    }

    async fn machines_by_owner(&self, owner: UserId) -> DeployResult<Vec<Machine>> {
        self.calls.lock().owner_lookups.push(owner);
        let mut owned: Vec<Machine> = self
            .machines
            .values()
            .filter(|m| m.owner_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.machine_name.cmp(&b.machine_name));
        decode(200, &ok(&owned))
    }

    async fn machine_by_name(&self, name: &str) -> DeployResult<Machine> {
        self.calls.lock().machine_lookups.push(name.to_string());
        match self.machines.get(name) {
            Some(machine) => decode(200, &ok(machine)),
            None => decode(404, &not_found(&format!("machine {name} not found"))),
        }
    }

    async fn ingress_by_domain(&self, domain: &str) -> DeployResult<Option<Ingress>> {
        self.calls.lock().domain_lookups.push(domain.to_string());
        let answer = if self.taken_domains.contains(domain) {
            Ingress {
                ingress_id: IngressId::new(),
                domain_name: domain.to_string(),
                ..Ingress::default()
            }
        } else {
            Ingress::default()
        };
        decode_ingress_lookup(200, &ok(&answer))
    }

    async fn create_deployment(&self, deployment: &Deployment) -> DeployResult<DeploymentId> {
        let id = DeploymentId::new();
        self.calls.lock().deployments.push(Deployment {
            deployment_id: id,
            ..deployment.clone()
        });
        match &self.deployment_answer {
            Some(canned) => decode(canned.status, canned.body.as_bytes()),
            None => decode(200, &ok(&id)),
        }
    }

    async fn create_service(&self, service: &Service) -> DeployResult<ServiceId> {
        self.calls.lock().services.push(service.clone());
        decode(200, &ok(&ServiceId::new()))
    }

    async fn create_ingress(&self, ingress: &Ingress) -> DeployResult<IngressId> {
        self.calls.lock().ingresses.push(ingress.clone());
        decode_ingress_id(200, &ok(&IngressId::new().to_string()))
    }

    async fn create_volume(&self, volume: &Volume) -> DeployResult<()> {
        self.calls.lock().volumes.push(volume.clone());
        check_status(200, &ok(&"volume created"))
    }

    async fn create_environment(&self, environment: &Environment) -> DeployResult<Environment> {
        self.calls.lock().environments.push(environment.clone());
        let saved = Environment {
            environment_id: EnvironmentId::new(),
            ..environment.clone()
        };
        decode(200, &ok(&saved))
    }

    async fn deployment_status(&self, _id: DeploymentId) -> DeployResult<StatusReport> {
        self.calls.lock().status_polls += 1;
        let (status, progress) = {
            let mut statuses = self.statuses.lock();
            if statuses.len() > 1 {
                statuses.pop_front()
            } else {
                statuses.front().cloned()
            }
        }
        .unwrap_or_else(|| ("pending".to_string(), 0));
        decode(
            200,
            &ok(&json!({ "status": status, "progress": progress, "message": format!("{status}...") })),
        )
    }

    async fn list_deployments(&self, namespace: &str) -> DeployResult<Vec<Deployment>> {
        let listed: Vec<Deployment> = self
            .calls
            .lock()
            .deployments
            .iter()
            .filter(|d| d.namespace == namespace)
            .cloned()
            .collect();
        decode(200, &ok(&listed))
    }

    async fn get_deployment(&self, id: DeploymentId) -> DeployResult<Deployment> {
        let found = self.calls.lock().deployments.iter().find(|d| d.deployment_id == id).cloned();
        match found {
            Some(deployment) => decode(200, &ok(&deployment)),
            None => decode(404, &not_found("deployment not found")),
        }
    }
}

/// Toolchain that "builds" instantly and exports a few bytes.
#[derive(Debug, Default)]
pub struct StubToolchain {
    builds: Mutex<Vec<(PathBuf, PathBuf, String)>>,
}

impl StubToolchain {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContainerToolchain for StubToolchain {
    async fn project_name(&self, _working_dir: &Path) -> DeployResult<String> {
        Ok(PROJECT.to_string())
    }

    async fn build(&self, recipe: &Path, context: &Path, tag: &str) -> DeployResult<()> {
        self.builds
            .lock()
            .push((recipe.to_path_buf(), context.to_path_buf(), tag.to_string()));
        Ok(())
    }

    async fn export(&self, tag: &str, archive: &ImageArchive) -> DeployResult<()> {
        std::fs::write(archive.path(), format!("image {tag}"))?;
        Ok(())
    }
}

/// A project directory with a valid Dockerfile.
pub fn project_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Dockerfile"),
        "FROM node:20-alpine\nWORKDIR /app\nCOPY . .\nRUN npm ci\nEXPOSE 8080\nCMD [\"node\", \"server.js\"]\n",
    )
    .unwrap();
    dir
}

/// A logged-in session in the `acme` organization.
pub fn session(user: UserId) -> SessionContext {
    SessionContext::new("test-token", "acme", user, "test-config-key")
}

/// Parses `argv` (without the program name) as a `deploy` subcommand.
pub fn deploy_command(argv: &[&str]) -> DeployCommands {
    let mut full = vec!["satusky", "deploy"];
    full.extend_from_slice(argv);
    match Cli::parse_from(full).command {
        Commands::Deploy { command } => command,
    }
}

/// A deploy command over the stubs, acting for `user` in `dir`.
pub fn command(platform: StubPlatform, user: UserId, dir: &Path) -> DeployCommand<StubPlatform, StubToolchain> {
    DeployCommand::new(platform, StubToolchain::new(), session(user), dir)
}

/// Runs a `deploy` subcommand on an existing command.
pub async fn run_with(
    command: &DeployCommand<StubPlatform, StubToolchain>,
    argv: &[&str],
) -> (Result<(), CliError>, String) {
    let mut out = Vec::new();
    let result = command
        .execute(&mut out, &OutputFormat::new(Format::Table), &deploy_command(argv))
        .await;
    (result, String::from_utf8(out).unwrap())
}
