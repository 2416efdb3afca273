//! Public domain allocation for deployments without a custom domain.

use rand::Rng;

use crate::api::PlatformApi;
use crate::error::{DeployError, DeployResult};

/// Suffix every generated domain lives under.
pub const DOMAIN_SUFFIX: &str = "satusky.com";

/// Length of the random token appended after a collision.
pub const COLLISION_TOKEN_LEN: usize = 6;

const TOKEN_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Lower-cases a project name and replaces `_` and `.` with `-`.
#[must_use]
pub fn clean_label(project_name: &str) -> String {
    project_name.to_lowercase().replace(['_', '.'], "-")
}

/// Random token drawn uniformly from `[a-z0-9]`.
#[must_use]
pub fn collision_token() -> String {
    let mut rng = rand::thread_rng();
    (0..COLLISION_TOKEN_LEN)
        .map(|_| char::from(TOKEN_CHARSET[rng.gen_range(0..TOKEN_CHARSET.len())]))
        .collect()
}

/// Finds a domain that no ingress uses yet.
#[derive(Debug)]
pub struct DomainAllocator<'a, P> {
    api: &'a P,
    max_attempts: Option<usize>,
}

impl<'a, P: PlatformApi> DomainAllocator<'a, P> {
    /// Creates an allocator that keeps trying names until one is free.
    #[must_use]
    pub const fn new(api: &'a P) -> Self {
        Self {
            api,
            max_attempts: None,
        }
    }

    /// Gives up after `attempts` lookups.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Returns `requested` unchanged, or the first free
    /// `<clean>[-<token>].satusky.com` for `project_name`.
    ///
    /// # Errors
    ///
    /// Returns the lookup error, or a remote error once the attempt bound is
    /// reached.
    pub async fn allocate(&self, requested: Option<&str>, project_name: &str) -> DeployResult<String> {
        if let Some(domain) = requested.filter(|d| !d.is_empty()) {
            return Ok(domain.to_string());
        }

        let clean = clean_label(project_name);
        let mut candidate = format!("{clean}.{DOMAIN_SUFFIX}");
        let mut attempts = 0usize;

        loop {
            attempts += 1;
            match self.api.ingress_by_domain(&candidate).await? {
                None => {
                    tracing::debug!(domain = %candidate, attempts, "domain is free");
                    return Ok(candidate);
                }
                Some(existing) => {
                    tracing::debug!(domain = %candidate, ingress = %existing.ingress_id, "domain taken");
                }
            }

            if self.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(DeployError::remote(
                    None,
                    format!("no free domain for {clean} after {attempts} attempts; pass --domain"),
                ));
            }
            candidate = format!("{clean}-{}.{DOMAIN_SUFFIX}", collision_token());
        }
    }
}
