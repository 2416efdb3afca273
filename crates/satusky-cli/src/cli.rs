//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Default platform API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.satusky.com/v1/cli";

/// Satusky CLI - deploy containerised apps to the Satusky platform.
#[derive(Parser, Debug, Clone)]
#[command(name = "satusky")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Platform API URL.
    #[arg(long, env = "SATUSKY_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table, global = true)]
    pub format: Format,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Deploy and inspect applications.
    Deploy {
        /// Deploy subcommand to execute.
        #[command(subcommand)]
        command: DeployCommands,
    },
}

/// Deploy subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum DeployCommands {
    /// Build the current project and deploy it.
    Create(CreateArgs),

    /// Show the status of a deployment.
    Status {
        /// Deployment to inspect.
        #[arg(long)]
        deployment_id: String,

        /// Poll until the deployment completes or fails.
        #[arg(short, long)]
        watch: bool,

        /// Give up watching after this many seconds.
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },

    /// List deployments in a namespace.
    List {
        /// Namespace to list; defaults to the session organization.
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Show a single deployment.
    Get {
        /// Deployment to show.
        #[arg(long)]
        deployment_id: String,
    },
}

/// Arguments for `deploy create`.
///
/// Values are checked when the command runs so that every invalid flag is
/// reported as a preflight failure.
#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// CPU request, e.g. `1`, `0.5` or `250m`.
    #[arg(long)]
    pub cpu: String,

    /// Memory request, e.g. `512Mi` or `2Gi`.
    #[arg(long)]
    pub memory: String,

    /// Machine to run on. Repeat for several replicas.
    #[arg(long = "machine")]
    pub machines: Vec<String>,

    /// Custom domain; a `satusky.com` subdomain is allocated otherwise.
    #[arg(long)]
    pub domain: Option<String>,

    /// Target organization; defaults to the session organization.
    #[arg(long)]
    pub organization: Option<String>,

    /// Dockerfile to build from.
    #[arg(long)]
    pub dockerfile: Option<PathBuf>,

    /// Port the app listens on.
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Environment variable as `KEY=VALUE`. Repeatable.
    #[arg(short, long = "env")]
    pub env: Vec<String>,

    /// Volume size, e.g. `10Gi`. Requires `--volume-mount`.
    #[arg(long)]
    pub volume_size: Option<String>,

    /// Volume mount path. Requires `--volume-size`.
    #[arg(long)]
    pub volume_mount: Option<String>,

    /// JSON file listing dependencies to deploy alongside the app.
    #[arg(long)]
    pub dependencies: Option<PathBuf>,
}
