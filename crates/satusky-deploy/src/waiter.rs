//! Polls a deployment until it reaches a terminal state.

use std::time::Duration;

use satusky_proto::{DeploymentId, DeploymentPhase, StatusReport};
use tokio::time::MissedTickBehavior;

use crate::api::PlatformApi;
use crate::error::{DeployError, DeployResult};

/// Time between status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default deadline for `deploy status --watch`.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Waits for a deployment to complete or fail.
#[derive(Debug)]
pub struct StatusWaiter<'a, P> {
    api: &'a P,
    interval: Duration,
}

impl<'a, P: PlatformApi> StatusWaiter<'a, P> {
    /// Creates a waiter polling every [`POLL_INTERVAL`].
    #[must_use]
    pub const fn new(api: &'a P) -> Self {
        Self {
            api,
            interval: POLL_INTERVAL,
        }
    }

    /// Polls `id` until `completed`, `failed` or `timeout`.
    ///
    /// `on_update` sees every non-terminal report. The first poll happens
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::DeploymentFailed`] with the platform's message,
    /// [`DeployError::Timeout`] past the deadline, a protocol error for an
    /// unknown status, or the first request error.
    pub async fn wait<F>(
        &self,
        id: DeploymentId,
        timeout: Duration,
        mut on_update: F,
    ) -> DeployResult<StatusReport>
    where
        F: FnMut(&StatusReport) + Send,
    {
        let poll = async {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let report = self.api.deployment_status(id).await?;
                match report.phase()? {
                    DeploymentPhase::Completed => return Ok(report),
                    DeploymentPhase::Failed => {
                        return Err(DeployError::DeploymentFailed {
                            message: report.message,
                        });
                    }
                    phase => {
                        tracing::debug!(%id, %phase, progress = report.progress, "deployment in progress");
                        on_update(&report);
                    }
                }
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| DeployError::Timeout { waited: timeout })?
    }
}
