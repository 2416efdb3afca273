//! Machine inventory records.

use serde::{Deserialize, Serialize};

use crate::types::{MachineId, UserId};

/// A machine in the platform inventory.
///
/// The trailing optional fields are only consulted for filtering and display
/// by inventory commands; the deploy pipeline reads the name and owner.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Machine {
    /// Machine identifier.
    #[serde(default)]
    pub machine_id: MachineId,
    /// Unique machine name.
    pub machine_name: String,
    /// Owning user.
    #[serde(default)]
    pub owner_id: UserId,
    /// Region code.
    #[serde(default)]
    pub machine_region: String,
    /// Zone code.
    #[serde(default)]
    pub machine_zone: String,
    /// CPU core count.
    #[serde(default)]
    pub cpu_cores: u32,
    /// Memory in GB.
    #[serde(default)]
    pub memory_gb: u32,
    /// Whether the owner rents this machine to the fleet.
    #[serde(default)]
    pub monetized: bool,
    /// Lifecycle status (`active`, `offline`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Node type (`worker`, `control-plane`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    /// Pricing tier name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_tier: Option<String>,
    /// Hourly cost in credits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_cost: Option<f64>,
    /// Whether the machine has a GPU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_gpu: Option<bool>,
    /// Scheduler resource score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_score: Option<f64>,
    /// Uptime over the last 30 days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_percent: Option<f64>,
    /// Whether the platform recommends this machine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended: Option<bool>,
}

impl Machine {
    /// Returns true if `user` owns this machine.
    #[must_use]
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        !self.owner_id.is_nil() && self.owner_id == *user
    }
}
