//! String validators for domains, environment pairs, volume flags and
//! container image references.

use crate::error::ValidationError;
use crate::quantity::validate_storage_size;
use crate::sanitized::{DomainName, EnvKey, ImageReference, MountPath, Sanitized, StorageSize};
use crate::{MAX_DOMAIN_LENGTH, MAX_ENV_KEY_LENGTH, MAX_ENV_VALUE_LENGTH, MAX_IMAGE_REFERENCE_LENGTH};
use once_cell::sync::Lazy;
use regex::Regex;

/// Optional `*.` wildcard, alphanumeric labels, TLD of at least two letters.
static DOMAIN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*\.)?([a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$")
        .unwrap_or_else(|_| unreachable!())
});

static ENV_KEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap_or_else(|_| unreachable!()));

/// `[host[:port]/]component(/component)*[:tag][@sha256:digest]`
static IMAGE_REFERENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*(?::[0-9]+)?/)?",
        r"[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*",
        r"(?:/[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*)*",
        r"(?::[A-Za-z0-9_][A-Za-z0-9_.-]{0,127})?",
        r"(?:@sha256:[a-f0-9]{64})?$",
    ))
    .unwrap_or_else(|_| unreachable!())
});

static STAGE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap_or_else(|_| unreachable!()));

fn check_null_bytes(field: &str, input: &str) -> Result<(), ValidationError> {
    if input.contains('\0') {
        return Err(ValidationError::null_byte(field));
    }
    Ok(())
}

/// Validate a user-supplied domain such as `example.com` or `*.example.com`.
///
/// # Errors
///
/// Returns `ValidationError` if the domain is empty, too long, or malformed.
pub fn validate_domain(domain: &str) -> Result<Sanitized<DomainName>, ValidationError> {
    let field = "domain";
    let domain = domain.trim();

    if domain.is_empty() {
        return Err(ValidationError::empty(field));
    }
    if domain.len() > MAX_DOMAIN_LENGTH {
        return Err(ValidationError::too_long(field, MAX_DOMAIN_LENGTH, domain.len()));
    }
    if !DOMAIN_REGEX.is_match(domain) {
        return Err(ValidationError::invalid_format(
            field,
            "a fully qualified domain name (e.g. app.example.com)",
            domain,
        ));
    }

    Ok(Sanitized::new(domain.to_string()))
}

/// Parse a `KEY=VALUE` pair given to `--env`.
///
/// The value is everything after the first `=` and may be empty.
///
/// # Errors
///
/// Returns `ValidationError` if the `=` is missing or the key is not a
/// valid environment variable name.
pub fn parse_env_pair(pair: &str) -> Result<(Sanitized<EnvKey>, String), ValidationError> {
    let field = "env";

    let Some((key, value)) = pair.split_once('=') else {
        return Err(ValidationError::invalid_env_var(
            field,
            format!("expected KEY=VALUE, got '{pair}'"),
        ));
    };

    let key = key.trim();
    if key.is_empty() {
        return Err(ValidationError::invalid_env_var(field, "key cannot be empty"));
    }
    if key.len() > MAX_ENV_KEY_LENGTH {
        return Err(ValidationError::too_long(field, MAX_ENV_KEY_LENGTH, key.len()));
    }
    if !ENV_KEY_REGEX.is_match(key) {
        return Err(ValidationError::invalid_env_var(
            field,
            format!("'{key}' must start with a letter or underscore and contain only letters, digits and underscores"),
        ));
    }
    if value.len() > MAX_ENV_VALUE_LENGTH {
        return Err(ValidationError::too_long(field, MAX_ENV_VALUE_LENGTH, value.len()));
    }
    check_null_bytes(field, value)?;

    Ok((Sanitized::new(key.to_string()), value.to_string()))
}

/// Validate an absolute in-container mount path.
///
/// # Errors
///
/// Returns `ValidationError` if the path is empty, relative, or contains
/// `..` segments.
pub fn validate_mount_path(path: &str) -> Result<Sanitized<MountPath>, ValidationError> {
    let field = "volume-mount";
    let path = path.trim();

    if path.is_empty() {
        return Err(ValidationError::empty(field));
    }
    check_null_bytes(field, path)?;
    if !path.starts_with('/') {
        return Err(ValidationError::relative_path(field));
    }
    if path.split('/').any(|segment| segment == "..") {
        return Err(ValidationError::path_traversal(field, ".."));
    }

    Ok(Sanitized::new(path.to_string()))
}

/// Validate the `--volume-size` / `--volume-mount` pair.
///
/// Both flags must be given together. Returns `None` when neither is set.
///
/// # Errors
///
/// Returns `ValidationError` if only one flag is set or either value is
/// invalid.
pub fn validate_volume_flags(
    size: Option<&str>,
    mount: Option<&str>,
) -> Result<Option<(Sanitized<StorageSize>, Sanitized<MountPath>)>, ValidationError> {
    match (size, mount) {
        (None, None) => Ok(None),
        (Some(_), None) => Err(ValidationError::missing_companion(
            "volume-size",
            "--volume-mount",
        )),
        (None, Some(_)) => Err(ValidationError::missing_companion(
            "volume-mount",
            "--volume-size",
        )),
        (Some(size), Some(mount)) => Ok(Some((
            validate_storage_size(size)?,
            validate_mount_path(mount)?,
        ))),
    }
}

/// Validate an image reference as it appears in a `FROM` line.
///
/// The literal `scratch` is accepted.
///
/// # Errors
///
/// Returns `ValidationError` if the reference is empty, too long, or
/// does not match the registry reference grammar.
pub fn validate_image_reference(
    reference: &str,
) -> Result<Sanitized<ImageReference>, ValidationError> {
    let field = "image";

    if reference.is_empty() {
        return Err(ValidationError::empty(field));
    }
    if reference.len() > MAX_IMAGE_REFERENCE_LENGTH {
        return Err(ValidationError::too_long(
            field,
            MAX_IMAGE_REFERENCE_LENGTH,
            reference.len(),
        ));
    }
    if reference == "scratch" || IMAGE_REFERENCE_REGEX.is_match(reference) {
        return Ok(Sanitized::new(reference.to_string()));
    }

    Err(ValidationError::invalid_image_name(
        field,
        format!("'{reference}' is not a valid [registry[:port]/]name[:tag][@sha256:digest] reference"),
    ))
}

/// Check whether a string is a valid build stage name.
#[must_use]
pub fn is_valid_stage_name(name: &str) -> bool {
    STAGE_NAME_REGEX.is_match(name)
}
