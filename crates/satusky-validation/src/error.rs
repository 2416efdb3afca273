//! Rejection reasons for deploy flags and command arguments.

use thiserror::Error;

/// Why a value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationErrorKind {
    /// A required value was empty.
    #[error("value is required")]
    Empty,

    /// Longer than allowed.
    #[error("{actual} characters is over the limit of {max}")]
    TooLong {
        /// Longest accepted length.
        max: usize,
        /// Length of the input.
        actual: usize,
    },

    /// Did not parse as the expected shape.
    #[error("expected {expected}, got '{actual}'")]
    InvalidFormat {
        /// Human description of the accepted shape.
        expected: String,
        /// The rejected input.
        actual: String,
    },

    /// A number outside its accepted range.
    #[error("{actual} is outside {min}..={max}")]
    OutOfRange {
        /// Lower bound, inclusive.
        min: u64,
        /// Upper bound, inclusive.
        max: u64,
        /// The rejected value.
        actual: u64,
    },

    /// A well-formed quantity smaller than the platform accepts.
    #[error("'{actual}' is below the minimum of {min}")]
    BelowMinimum {
        /// Smallest accepted quantity.
        min: String,
        /// The rejected quantity.
        actual: String,
    },

    /// Given without the flag it pairs with.
    #[error("requires {requires}")]
    MissingCompanion {
        /// The flag that must be given too.
        requires: String,
    },

    /// Not a usable image reference.
    #[error("invalid image name: {reason}")]
    InvalidImageName {
        /// What is wrong with it.
        reason: String,
    },

    /// A malformed `KEY=VALUE` pair.
    #[error("bad environment variable: {reason}")]
    InvalidEnvVar {
        /// What is wrong with it.
        reason: String,
    },

    /// A mount path that is not absolute.
    #[error("path must be absolute")]
    RelativePath,

    /// A character that changes meaning when it reaches a process.
    #[error("character {found:?} is not allowed")]
    ShellInjection {
        /// The offending character.
        found: char,
    },

    /// A `..` component or similar.
    #[error("'{pattern}' may not appear in a path")]
    PathTraversal {
        /// The offending sequence.
        pattern: String,
    },

    /// An embedded NUL.
    #[error("contains a NUL byte")]
    NullByte,
}

/// A flag or argument that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {kind}")]
pub struct ValidationError {
    /// Flag or argument name, e.g. `cpu` or `--volume-size`.
    pub field: String,
    /// Why it was rejected.
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    /// Pairs a field with a rejection reason.
    #[must_use]
    pub fn new(field: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }

    #[must_use]
    pub(crate) fn empty(field: impl Into<String>) -> Self {
        Self::new(field, ValidationErrorKind::Empty)
    }

    #[must_use]
    pub(crate) fn too_long(field: impl Into<String>, max: usize, actual: usize) -> Self {
        Self::new(field, ValidationErrorKind::TooLong { max, actual })
    }

    #[must_use]
    pub(crate) fn invalid_format(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let kind = ValidationErrorKind::InvalidFormat {
            expected: expected.into(),
            actual: actual.into(),
        };
        Self::new(field, kind)
    }

    #[must_use]
    pub(crate) fn out_of_range(field: impl Into<String>, min: u64, max: u64, actual: u64) -> Self {
        Self::new(field, ValidationErrorKind::OutOfRange { min, max, actual })
    }

    #[must_use]
    pub(crate) fn below_minimum(
        field: impl Into<String>,
        min: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let kind = ValidationErrorKind::BelowMinimum {
            min: min.into(),
            actual: actual.into(),
        };
        Self::new(field, kind)
    }

    #[must_use]
    pub(crate) fn missing_companion(field: impl Into<String>, requires: impl Into<String>) -> Self {
        let requires = requires.into();
        Self::new(field, ValidationErrorKind::MissingCompanion { requires })
    }

    #[must_use]
    pub(crate) fn invalid_image_name(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(field, ValidationErrorKind::InvalidImageName { reason })
    }

    #[must_use]
    pub(crate) fn invalid_env_var(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(field, ValidationErrorKind::InvalidEnvVar { reason })
    }

    #[must_use]
    pub(crate) fn relative_path(field: impl Into<String>) -> Self {
        Self::new(field, ValidationErrorKind::RelativePath)
    }

    #[must_use]
    pub(crate) fn shell_injection(field: impl Into<String>, found: char) -> Self {
        Self::new(field, ValidationErrorKind::ShellInjection { found })
    }

    #[must_use]
    pub(crate) fn path_traversal(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        Self::new(field, ValidationErrorKind::PathTraversal { pattern })
    }

    #[must_use]
    pub(crate) fn null_byte(field: impl Into<String>) -> Self {
        Self::new(field, ValidationErrorKind::NullByte)
    }

    /// True when the value was missing.
    #[must_use]
    pub fn is_empty_error(&self) -> bool {
        self.kind == ValidationErrorKind::Empty
    }

    /// True for input that could alter a spawned process.
    #[must_use]
    pub fn is_security_error(&self) -> bool {
        matches!(
            self.kind,
            ValidationErrorKind::ShellInjection { .. }
                | ValidationErrorKind::PathTraversal { .. }
                | ValidationErrorKind::NullByte
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_the_field() {
        let err = ValidationError::empty("memory");
        assert!(err.is_empty_error());
        assert_eq!(err.to_string(), "invalid memory: value is required");
    }

    #[test]
    fn test_below_minimum_message() {
        let err = ValidationError::below_minimum("cpu", "10m", "9m");
        assert_eq!(err.to_string(), "invalid cpu: '9m' is below the minimum of 10m");
    }

    #[test]
    fn test_missing_companion_message() {
        let err = ValidationError::missing_companion("--volume-size", "--volume-mount");
        assert_eq!(err.to_string(), "invalid --volume-size: requires --volume-mount");
    }

    #[test]
    fn test_security_kinds() {
        assert!(ValidationError::shell_injection("argument", '\n').is_security_error());
        assert!(ValidationError::null_byte("argument").is_security_error());
        assert!(!ValidationError::out_of_range("port", 1, 65535, 0).is_security_error());
    }

    #[test]
    fn test_out_of_range_message() {
        let err = ValidationError::out_of_range("port", 1, 65535, 0);
        assert_eq!(err.to_string(), "invalid port: 0 is outside 1..=65535");
    }
}
