//! Error types for the satusky-proto crate.

use thiserror::Error;

/// Errors that can occur while decoding platform payloads.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Failed to decode a payload.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// The envelope carried no `data` field.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The envelope reported an application-level error.
    #[error("platform error: {0}")]
    Platform(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A deployment status outside the known set.
    #[error("unknown deployment status: {0}")]
    UnknownStatus(String),
}

impl From<serde_json::Error> for ProtoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decoding(err.to_string())
    }
}
