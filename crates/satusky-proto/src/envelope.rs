//! The `{error, message, count, data}` wrapper around every response.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ProtoError;

/// Response wrapper used by every platform endpoint.
///
/// `T` is the payload type for the specific endpoint, so decoding binds the
/// response shape directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the platform reported an application error.
    #[serde(default)]
    pub error: bool,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Item count for list endpoints.
    #[serde(default)]
    pub count: Option<u64>,
    /// The payload. A missing field decodes as `None`.
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Take the payload, failing when the envelope reports an error or has
    /// no data.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Platform`] when `error` is set, or
    /// [`ProtoError::MissingField`] when `data` is absent.
    pub fn into_data(self) -> Result<T, ProtoError> {
        if self.error {
            return Err(ProtoError::Platform(self.message));
        }
        self.data.ok_or(ProtoError::MissingField("data"))
    }
}

impl<T: DeserializeOwned> ApiEnvelope<T> {
    /// Decode an envelope from a response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a valid envelope for `T`.
    pub fn from_slice(body: &[u8]) -> Result<Self, ProtoError> {
        Ok(serde_json::from_slice(body)?)
    }
}

/// Extract just the `message` field from an error response body.
///
/// Returns `None` when the body is not JSON or carries no message.
#[must_use]
pub fn error_message(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct MessageOnly {
        #[serde(default)]
        message: Option<String>,
    }

    serde_json::from_slice::<MessageOnly>(body)
        .ok()
        .and_then(|m| m.message)
        .filter(|m| !m.is_empty())
}
