//! Identifier types shared by every platform resource.
//!
//! All identifiers are 128-bit UUIDs. The all-zero value is meaningful on the
//! wire: lookups that find nothing answer with a record whose identifier is
//! nil, and records that have not been created yet carry a nil identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ProtoError;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// The all-zero identifier.
            #[must_use]
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Returns true for the all-zero identifier.
            #[must_use]
            pub const fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// Parse an identifier from a string.
            ///
            /// Surrounding whitespace and JSON quotes are ignored, since some
            /// endpoints answer with a bare quoted string.
            ///
            /// # Errors
            ///
            /// Returns an error if the string is not a valid UUID.
            pub fn parse(s: &str) -> Result<Self, ProtoError> {
                let trimmed = s.trim().trim_matches('"');
                Uuid::parse_str(trimmed)
                    .map(Self)
                    .map_err(|e| ProtoError::InvalidId(format!(concat!("invalid ", $label, " ID '{}': {}"), trimmed, e)))
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = ProtoError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a deployment record.
    DeploymentId,
    "deployment"
);
define_id!(
    /// Identifier of a service record.
    ServiceId,
    "service"
);
define_id!(
    /// Identifier of an ingress record.
    IngressId,
    "ingress"
);
define_id!(
    /// Identifier of a volume record.
    VolumeId,
    "volume"
);
define_id!(
    /// Identifier of an environment record.
    EnvironmentId,
    "environment"
);
define_id!(
    /// Identifier of a platform user.
    UserId,
    "user"
);
define_id!(
    /// Identifier of a machine in the inventory.
    MachineId,
    "machine"
);
