//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use satusky_deploy::DeployOutcome;
use satusky_proto::{Deployment, DeploymentId, ResourceExhausted, StatusReport};

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Result of `deploy create`.
#[derive(Debug, Clone, Serialize)]
pub struct DeploySummary {
    /// Pipeline outcome.
    #[serde(flatten)]
    pub outcome: DeployOutcome,
    /// Public URL.
    pub url: String,
}

impl From<DeployOutcome> for DeploySummary {
    fn from(outcome: DeployOutcome) -> Self {
        let url = outcome.url();
        Self { outcome, url }
    }
}

impl TableDisplay for DeploySummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let outcome = &self.outcome;
        writeln!(writer)?;
        writeln!(writer, "Deployment ID:    {}", outcome.deployment_id)?;
        writeln!(writer, "Image:            {}", outcome.image)?;
        for dep in &outcome.dependencies {
            writeln!(writer, "Dependency:       {} ({})", dep.name, dep.deployment_id)?;
        }
        writeln!(writer)?;
        writeln!(
            writer,
            "🚀 Deployment for {} is successful! Your app is live at: {}",
            outcome.app_label, self.url
        )?;
        Ok(())
    }
}

/// Deployments in a namespace.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentList {
    /// Namespace that was listed.
    pub namespace: String,
    /// Deployments, as returned by the platform.
    pub deployments: Vec<Deployment>,
}

impl TableDisplay for DeploymentList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.deployments.is_empty() {
            writeln!(writer, "No deployments in {}", self.namespace)?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<36}  {:<20}  {:<10}  {:>8}  {:<6}  {:<7}  {:<16}",
            "ID", "LABEL", "STATUS", "REPLICAS", "CPU", "MEMORY", "CREATED"
        )?;
        writeln!(writer, "{}", "─".repeat(115))?;

        for d in &self.deployments {
            writeln!(
                writer,
                "{:<36}  {:<20}  {:<10}  {:>8}  {:<6}  {:<7}  {:<16}",
                d.deployment_id,
                truncate(&d.app_label, 20),
                or_dash(&d.status),
                d.replicas,
                d.cpu_request,
                d.memory_request,
                timestamp(d.created_at.as_ref()),
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} deployment(s)", self.deployments.len())?;
        Ok(())
    }
}

/// A single deployment.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct DeploymentDetail(pub Deployment);

impl TableDisplay for DeploymentDetail {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let d = &self.0;
        writeln!(writer, "Deployment: {}", d.app_label)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "ID:               {}", d.deployment_id)?;
        writeln!(writer, "Namespace:        {}", d.namespace)?;
        writeln!(writer, "Status:           {}", or_dash(&d.status))?;
        writeln!(writer, "Image:            {}", d.image)?;
        writeln!(writer, "Port:             {}", d.port)?;
        writeln!(writer)?;
        writeln!(writer, "Resources")?;
        writeln!(writer, "  CPU:            {}", d.cpu_request)?;
        writeln!(writer, "  Memory:         {} (limit {})", d.memory_request, d.memory_limit)?;
        writeln!(writer, "  Replicas:       {}", d.replicas)?;
        if !d.hostnames.is_empty() {
            writeln!(writer, "  Machines:       {}", d.hostnames.join(", "))?;
        }
        writeln!(writer)?;
        writeln!(writer, "Placement")?;
        writeln!(writer, "  Region:         {}", or_dash(&d.region))?;
        writeln!(writer, "  Zone:           {}", or_dash(&d.zone))?;
        writeln!(writer, "  Environment:    {}", or_dash(&d.environment))?;
        writeln!(writer)?;
        writeln!(writer, "Features")?;
        writeln!(writer, "  Env vars:       {}", check(d.env_enabled))?;
        writeln!(writer, "  Volume:         {}", check(d.volume_enabled))?;
        writeln!(writer)?;
        writeln!(writer, "Created:          {}", timestamp(d.created_at.as_ref()))?;
        writeln!(writer, "Updated:          {}", timestamp(d.updated_at.as_ref()))?;
        Ok(())
    }
}

/// Current status of a deployment.
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    /// Deployment the status belongs to.
    pub deployment_id: DeploymentId,
    /// Status as reported by the platform.
    #[serde(flatten)]
    pub report: StatusReport,
}

impl TableDisplay for StatusView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Deployment:       {}", self.deployment_id)?;
        writeln!(writer, "Status:           {}", self.report.status)?;
        writeln!(writer, "Progress:         {}%", self.report.progress)?;
        if !self.report.message.is_empty() {
            writeln!(writer, "Message:          {}", self.report.message)?;
        }
        Ok(())
    }
}

/// One line per intermediate status while watching.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_status_line<W: Write>(writer: &mut W, report: &StatusReport) -> Result<(), CliError> {
    if report.message.is_empty() {
        writeln!(writer, "⏳ {} ({}%)", report.status, report.progress)?;
    } else {
        writeln!(writer, "⏳ {} ({}%): {}", report.status, report.progress, report.message)?;
    }
    Ok(())
}

/// Renders a quota refusal with an upgrade hint when one is available.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_resource_exhausted<W: Write>(writer: &mut W, details: &ResourceExhausted) -> Result<(), CliError> {
    writeln!(writer)?;
    writeln!(writer, "Resource limit reached")?;
    writeln!(writer, "══════════════════════════════════")?;
    writeln!(writer, "Resource: {}", resource_label(&details.resource))?;
    writeln!(writer, "Requested: {}", details.requested)?;
    writeln!(writer, "Available: {}", details.available)?;
    if details.current_tier.is_empty() {
        writeln!(writer, "Limit: {}", details.limit)?;
    } else {
        writeln!(writer, "Limit: {} ({} tier)", details.limit, details.current_tier)?;
    }
    if let Some(suggestion) = details.suggestion.as_deref().filter(|s| !s.is_empty()) {
        writeln!(writer)?;
        writeln!(writer, "💡 {suggestion}")?;
    }
    if let Some(next) = details.next_tier.as_deref().filter(|_| details.can_upgrade) {
        writeln!(writer)?;
        writeln!(writer, "Upgrade available")?;
        writeln!(writer, "──────────────────────────────────")?;
        writeln!(
            writer,
            "The {next} tier raises your {} limit. Upgrade your plan to continue.",
            resource_label(&details.resource)
        )?;
    }
    Ok(())
}

fn resource_label(resource: &str) -> String {
    match resource.to_ascii_lowercase().as_str() {
        "cpu" => "CPU".to_string(),
        "gpu" => "GPU".to_string(),
        _ => {
            let mut chars = resource.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect())
                .unwrap_or_default()
        }
    }
}

const fn check(enabled: bool) -> &'static str {
    if enabled { "✓" } else { "✗" }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

fn timestamp(at: Option<&DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}
