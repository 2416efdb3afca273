//! Records what a pipeline run created so a failure can report it.
//!
//! Nothing is deleted automatically: the platform keeps every resource and
//! the list tells the operator what to remove.

use std::fmt;

use parking_lot::Mutex;
use satusky_proto::{DeploymentId, EnvironmentId, IngressId, ServiceId};

/// A remote resource created during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatedResource {
    /// A deployment record.
    Deployment {
        /// Remote identifier.
        id: DeploymentId,
        /// App label.
        app_label: String,
    },
    /// A service record.
    Service {
        /// Remote identifier.
        id: ServiceId,
        /// Service name.
        name: String,
    },
    /// An environment record.
    Environment {
        /// Remote identifier.
        id: EnvironmentId,
        /// App label it belongs to.
        app_label: String,
    },
    /// A volume and its claim.
    Volume {
        /// Volume name.
        name: String,
        /// Claim name.
        claim: String,
    },
    /// An ingress record.
    Ingress {
        /// Remote identifier.
        id: IngressId,
        /// Bound domain.
        domain: String,
    },
}

impl fmt::Display for CreatedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deployment { id, app_label } => write!(f, "deployment {app_label} ({id})"),
            Self::Service { id, name } => write!(f, "service {name} ({id})"),
            Self::Environment { id, app_label } => write!(f, "environment for {app_label} ({id})"),
            Self::Volume { name, claim } => write!(f, "volume {name} (claim {claim})"),
            Self::Ingress { id, domain } => write!(f, "ingress {domain} ({id})"),
        }
    }
}

/// Thread-safe, append-only list of created resources.
#[derive(Debug, Default)]
pub struct CleanupRegistry {
    created: Mutex<Vec<CreatedResource>>,
}

impl CleanupRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a created resource.
    pub fn record(&self, resource: CreatedResource) {
        tracing::debug!(resource = %resource, "created");
        self.created.lock().push(resource);
    }

    /// Everything recorded so far, in creation order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CreatedResource> {
        self.created.lock().clone()
    }

    /// Number of recorded resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.created.lock().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.lock().is_empty()
    }
}
