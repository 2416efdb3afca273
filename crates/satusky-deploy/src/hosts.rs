//! Resolves which machines a deployment runs on.

use satusky_proto::UserId;

use crate::api::PlatformApi;
use crate::error::{DeployError, DeployResult};

/// Picks target machines for a deployment.
#[derive(Debug)]
pub struct HostSelector<'a, P> {
    api: &'a P,
    user_id: UserId,
}

impl<'a, P: PlatformApi> HostSelector<'a, P> {
    /// Creates a selector acting for `user_id`.
    #[must_use]
    pub const fn new(api: &'a P, user_id: UserId) -> Self {
        Self { api, user_id }
    }

    /// Resolves the hostnames for a deployment.
    ///
    /// Requested machines must all belong to the current user. With no
    /// request, every machine the user owns is used. An empty result leaves
    /// placement to the platform's monetized pool.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Unauthorized`] for a machine owned by someone
    /// else, or the lookup error.
    pub async fn select(&self, requested: &[String]) -> DeployResult<Vec<String>> {
        if !requested.is_empty() {
            let mut resolved = Vec::with_capacity(requested.len());
            for name in requested {
                let machine = self.api.machine_by_name(name).await?;
                if !machine.is_owned_by(&self.user_id) {
                    return Err(DeployError::Unauthorized {
                        machine: name.clone(),
                    });
                }
                resolved.push(machine.machine_name);
            }
            tracing::debug!(hosts = ?resolved, "using requested machines");
            return Ok(resolved);
        }

        let owned: Vec<String> = self
            .api
            .machines_by_owner(self.user_id)
            .await?
            .into_iter()
            .map(|m| m.machine_name)
            .collect();
        if owned.is_empty() {
            tracing::debug!("no owned machines, platform will place the deployment");
        } else {
            tracing::debug!(hosts = ?owned, "using owned machines");
        }
        Ok(owned)
    }
}
