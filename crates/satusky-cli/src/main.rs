//! Satusky CLI binary entrypoint.
//!
//! This is the main entry point for the `satusky` command-line tool.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

use satusky_cli::cli::{Cli, Commands};
use satusky_cli::commands::DeployCommand;
use satusky_cli::output::{write_resource_exhausted, OutputFormat};
use satusky_cli::CliError;

const VERBOSE_TARGETS: [&str; 3] = ["satusky_cli", "satusky_deploy", "satusky_validation"];

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut filter = EnvFilter::from_default_env();
    if cli.verbose {
        for target in VERBOSE_TARGETS {
            if let Ok(directive) = format!("{target}=debug").parse() {
                filter = filter.add_directive(directive);
            }
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}", format!("❌ failed to create async runtime: {e}").red());
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout();

    match cli.command {
        Commands::Deploy { command } => {
            let cmd = DeployCommand::connect(&cli.api_url)?;
            cmd.execute(&mut stdout, &format, &command).await?;
        }
    }

    Ok(())
}

fn report(error: &CliError) {
    eprintln!("{}", format!("❌ {error}").red());
    if let Some(details) = error.resource_exhausted() {
        let mut stderr = io::stderr();
        if write_resource_exhausted(&mut stderr, details).is_err() {
            tracing::debug!("quota details could not be written");
        }
    }
}
