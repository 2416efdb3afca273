//! Input validation for the Satusky CLI.
//!
//! Every flag that reaches the deploy pipeline is checked here before any
//! remote call is made, and validated values are returned wrapped in
//! [`Sanitized`] so the type records what was checked.
//!
//! ```
//! use satusky_validation::{validate_cpu, validate_domain, validate_memory};
//!
//! assert!(validate_cpu("250m").is_ok());
//! assert!(validate_cpu("9m").is_err());
//! assert!(validate_memory("512Mi").is_ok());
//! assert!(validate_domain("*.example.com").is_ok());
//! ```
//!
//! The `command` feature (on by default) adds [`command::SafeCommand`], the
//! allow-listed runner used for `docker` and `git`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "command")]
pub mod command;
mod error;
mod numeric;
mod quantity;
mod sanitized;
mod strings;

#[cfg(feature = "command")]
pub use command::{AllowedProgram, CommandError, CommandOutput, SafeCommand};
pub use error::{ValidationError, ValidationErrorKind};
pub use numeric::{validate_port, validate_timeout, ValidatedPort, ValidatedTimeout};
pub use quantity::{validate_cpu, validate_memory, validate_storage_size};
pub use sanitized::{
    CpuQuantity, DomainName, EnvKey, ImageReference, MemoryQuantity, MountPath,
    SanitizationKind, Sanitized, StorageSize, ValidatedValue,
};
pub use strings::{
    is_valid_stage_name, parse_env_pair, validate_domain, validate_image_reference,
    validate_mount_path, validate_volume_flags,
};

/// Smallest CPU request expressed in millicores.
pub const MIN_MILLICORES: u64 = 10;

/// Maximum length of a domain name.
pub const MAX_DOMAIN_LENGTH: usize = 253;

/// Maximum length of an environment variable key.
pub const MAX_ENV_KEY_LENGTH: usize = 256;

/// Maximum length of an environment variable value.
pub const MAX_ENV_VALUE_LENGTH: usize = 32 * 1024;

/// Maximum length of an image reference.
pub const MAX_IMAGE_REFERENCE_LENGTH: usize = 512;

/// Longest accepted status-wait timeout (one day).
pub const MAX_WAIT_TIMEOUT_SECONDS: u64 = 24 * 60 * 60;
