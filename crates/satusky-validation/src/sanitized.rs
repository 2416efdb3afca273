//! Validated value wrappers tagged with what was checked.

use std::fmt;
use std::marker::PhantomData;

/// Marker trait for sanitization kinds.
pub trait SanitizationKind: private::Sealed {}

mod private {
    pub trait Sealed {}
}

macro_rules! sanitization_kind {
    ($(#[$doc:meta] $name:ident),* $(,)?) => {
        $(
            #[$doc]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct $name;
            impl private::Sealed for $name {}
            impl SanitizationKind for $name {}
        )*
    };
}

sanitization_kind! {
    /// Marker for CPU quantities such as `1`, `0.5` or `250m`.
    CpuQuantity,
    /// Marker for memory quantities such as `512Mi` or `2Gi`.
    MemoryQuantity,
    /// Marker for persistent volume sizes.
    StorageSize,
    /// Marker for fully qualified domain names.
    DomainName,
    /// Marker for environment variable keys.
    EnvKey,
    /// Marker for absolute container mount paths.
    MountPath,
    /// Marker for container image references.
    ImageReference,
}

/// A string that passed validation for kind `K`.
///
/// ```
/// use satusky_validation::{validate_memory, MemoryQuantity, Sanitized};
///
/// let memory: Sanitized<MemoryQuantity> = validate_memory("512Mi")?;
/// assert_eq!(memory.as_str(), "512Mi");
/// # Ok::<(), satusky_validation::ValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sanitized<K: SanitizationKind> {
    value: String,
    _marker: PhantomData<K>,
}

impl<K: SanitizationKind> Sanitized<K> {
    /// Wrap a value that has already been validated.
    #[must_use]
    pub(crate) fn new(value: String) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// Get the sanitized string as a slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Consume the wrapper and return the inner value.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.value
    }
}

impl<K: SanitizationKind> AsRef<str> for Sanitized<K> {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl<K: SanitizationKind> fmt::Display for Sanitized<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// A validated numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValidatedValue<T> {
    value: T,
}

impl<T: Copy> ValidatedValue<T> {
    /// Create a new validated value.
    #[must_use]
    pub(crate) const fn new(value: T) -> Self {
        Self { value }
    }

    /// Get the inner value.
    #[must_use]
    pub const fn value(&self) -> T {
        self.value
    }
}

impl<T: fmt::Display> fmt::Display for ValidatedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
