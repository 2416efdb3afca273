//! Numeric validation functions.

use crate::error::ValidationError;
use crate::sanitized::ValidatedValue;
use crate::MAX_WAIT_TIMEOUT_SECONDS;

/// Type alias for validated port numbers.
pub type ValidatedPort = ValidatedValue<u16>;

/// Type alias for validated status-wait timeouts in seconds.
pub type ValidatedTimeout = ValidatedValue<u64>;

/// Validate a port number.
///
/// Ports must be in the range 1-65535.
///
/// # Errors
///
/// Returns `ValidationError` if the port is out of range.
pub fn validate_port(port: u16) -> Result<ValidatedPort, ValidationError> {
    if port == 0 {
        return Err(ValidationError::out_of_range("port", 1, 65535, 0));
    }
    Ok(ValidatedValue::new(port))
}

/// Validate a status-wait timeout in seconds.
///
/// # Errors
///
/// Returns `ValidationError` if the timeout is zero or longer than a day.
pub fn validate_timeout(seconds: u64) -> Result<ValidatedTimeout, ValidationError> {
    if seconds == 0 || seconds > MAX_WAIT_TIMEOUT_SECONDS {
        return Err(ValidationError::out_of_range(
            "timeout",
            1,
            MAX_WAIT_TIMEOUT_SECONDS,
            seconds,
        ));
    }
    Ok(ValidatedValue::new(seconds))
}
