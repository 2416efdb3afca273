//! The on-disk session context written by `auth login`.
//!
//! The pipeline never reads the file itself: callers load a
//! [`SessionContext`] once and hand it to the orchestrator.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use satusky_proto::UserId;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DeployError, DeployResult};

/// Directory under the home directory holding CLI state.
pub const CONTEXT_DIR: &str = ".satusky";

/// File name of the session context.
pub const CONTEXT_FILE: &str = "context.json";

/// Environment variable carrying the bootstrap API key.
pub const API_KEY_ENV: &str = "SATUSKY_API_KEY";

/// Credentials and namespace for the current user.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// API token sent as `x-satusky-api-key`.
    #[serde(default)]
    pub token: String,
    /// Organization name, used as the namespace.
    #[serde(default)]
    pub organization: String,
    /// Current user.
    #[serde(default, deserialize_with = "lenient_user_id")]
    pub user_id: UserId,
    /// Config key sent as `x-satusky-config`.
    #[serde(default)]
    pub user_config_key: String,
    /// Bootstrap key from `SATUSKY_API_KEY`, consumed by `auth login`.
    #[serde(skip)]
    pub bootstrap_key: Option<String>,
}

fn lenient_user_id<'de, D>(deserializer: D) -> Result<UserId, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(UserId::nil()),
        Some(s) => UserId::parse(s).map_err(serde::de::Error::custom),
    }
}

impl SessionContext {
    /// Builds a context in memory.
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        organization: impl Into<String>,
        user_id: UserId,
        user_config_key: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            organization: organization.into(),
            user_id,
            user_config_key: user_config_key.into(),
            bootstrap_key: None,
        }
    }

    /// `~/.satusky/context.json`, or relative to the working directory when
    /// there is no home directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONTEXT_DIR)
            .join(CONTEXT_FILE)
    }

    /// Loads the context from `path`.
    ///
    /// A missing file yields an empty context, which then fails
    /// [`require_credentials`](Self::require_credentials).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> DeployResult<Self> {
        let mut context = match fs::read(path) {
            Ok(bytes) => serde_json::from_slice::<Self>(&bytes).map_err(|e| {
                DeployError::preflight(format!(
                    "session context at {} is unreadable: {e}; run `satusky auth login` again",
                    path.display()
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no session context on disk");
                Self::default()
            }
            Err(e) => return Err(DeployError::Io(e)),
        };
        context.bootstrap_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        Ok(context)
    }

    /// Loads the context from [`default_path`](Self::default_path).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_default() -> DeployResult<Self> {
        Self::load(&Self::default_path())
    }

    /// Writes the context to `path`, readable only by the owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> DeployResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| DeployError::protocol(format!("cannot encode session context: {e}")))?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;
        file.write_all(&json)?;
        file.sync_all()?;
        Ok(())
    }

    /// Whether a token and config key are present.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.token.is_empty() && !self.user_config_key.is_empty()
    }

    /// Fails unless the user is logged in.
    ///
    /// # Errors
    ///
    /// Returns a preflight error naming the login command.
    pub fn require_credentials(&self) -> DeployResult<()> {
        if !self.has_credentials() {
            return Err(DeployError::preflight(
                "not logged in: run `satusky auth login` first",
            ));
        }
        if self.user_id.is_nil() {
            return Err(DeployError::preflight(
                "session has no user id: run `satusky auth login` again",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(s: &str) -> &'static str {
            if s.is_empty() { "<empty>" } else { "<redacted>" }
        }
        f.debug_struct("SessionContext")
            .field("token", &redact(&self.token))
            .field("organization", &self.organization)
            .field("user_id", &self.user_id)
            .field("user_config_key", &redact(&self.user_config_key))
            .field("bootstrap_key", &self.bootstrap_key.as_deref().map(redact))
            .finish()
    }
}
