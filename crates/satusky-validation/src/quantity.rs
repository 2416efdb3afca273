//! Resource quantity validators for `--cpu`, `--memory` and `--volume-size`.

use crate::error::ValidationError;
use crate::sanitized::{CpuQuantity, MemoryQuantity, Sanitized, StorageSize};
use crate::MIN_MILLICORES;
use once_cell::sync::Lazy;
use regex::Regex;

static CPU_CORES_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?$").unwrap_or_else(|_| unreachable!()));

static CPU_MILLICORES_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)m$").unwrap_or_else(|_| unreachable!()));

static MEMORY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(Mi|Gi)$").unwrap_or_else(|_| unreachable!()));

static STORAGE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(Mi|Gi|Ti)$").unwrap_or_else(|_| unreachable!()));

/// Validate a CPU quantity.
///
/// Accepts a positive decimal core count (`1`, `0.5`) or an integer number
/// of millicores with an `m` suffix, at least `10m`.
///
/// # Errors
///
/// Returns `ValidationError` if the quantity is malformed, zero, or below
/// the millicore minimum.
pub fn validate_cpu(input: &str) -> Result<Sanitized<CpuQuantity>, ValidationError> {
    const FIELD: &str = "cpu";
    const EXPECTED: &str = "a positive core count (e.g. 1, 0.5) or millicores (e.g. 250m)";

    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::empty(FIELD));
    }

    if let Some(caps) = CPU_MILLICORES_REGEX.captures(input) {
        let millis: u64 = caps[1]
            .parse()
            .map_err(|_| ValidationError::invalid_format(FIELD, EXPECTED, input))?;
        if millis < MIN_MILLICORES {
            return Err(ValidationError::below_minimum(
                FIELD,
                format!("{MIN_MILLICORES}m"),
                input,
            ));
        }
        return Ok(Sanitized::new(input.to_string()));
    }

    if CPU_CORES_REGEX.is_match(input) {
        let cores: f64 = input
            .parse()
            .map_err(|_| ValidationError::invalid_format(FIELD, EXPECTED, input))?;
        if cores <= 0.0 {
            return Err(ValidationError::invalid_format(FIELD, EXPECTED, input));
        }
        return Ok(Sanitized::new(input.to_string()));
    }

    Err(ValidationError::invalid_format(FIELD, EXPECTED, input))
}

/// Validate a memory quantity: a positive integer followed by `Mi` or `Gi`.
///
/// # Errors
///
/// Returns `ValidationError` if the quantity is empty, malformed, or zero.
pub fn validate_memory(input: &str) -> Result<Sanitized<MemoryQuantity>, ValidationError> {
    validate_binary_quantity("memory", input, &MEMORY_REGEX, "a positive integer with Mi or Gi (e.g. 512Mi)")
        .map(Sanitized::new)
}

/// Validate a persistent volume size: a positive integer followed by `Mi`,
/// `Gi` or `Ti`.
///
/// # Errors
///
/// Returns `ValidationError` if the size is empty, malformed, or zero.
pub fn validate_storage_size(input: &str) -> Result<Sanitized<StorageSize>, ValidationError> {
    validate_binary_quantity(
        "volume-size",
        input,
        &STORAGE_REGEX,
        "a positive integer with Mi, Gi or Ti (e.g. 10Gi)",
    )
    .map(Sanitized::new)
}

fn validate_binary_quantity(
    field: &str,
    input: &str,
    pattern: &Regex,
    expected: &str,
) -> Result<String, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::empty(field));
    }

    let Some(caps) = pattern.captures(input) else {
        return Err(ValidationError::invalid_format(field, expected, input));
    };

    let amount: u64 = caps[1]
        .parse()
        .map_err(|_| ValidationError::invalid_format(field, expected, input))?;
    if amount == 0 {
        return Err(ValidationError::invalid_format(field, expected, input));
    }

    Ok(input.to_string())
}
