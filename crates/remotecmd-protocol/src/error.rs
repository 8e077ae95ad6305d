//! Errors raised while encoding or decoding wire documents.

use thiserror::Error;

/// Failures at the wire boundary.
///
/// These never arise inside command execution; they are reported only where
/// text is turned into envelopes or results and back.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Input was not valid JSON or did not match the expected shape.
    #[error("malformed document: {message}")]
    Malformed {
        /// Description of the parse failure.
        message: String,
        /// Underlying JSON error, when one exists.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// A result carried a status code other than `0` or `1`.
    #[error("invalid result status code {code}")]
    InvalidStatus {
        /// Code found on the wire.
        code: u64,
    },

    /// A result named a class that is not in the registry.
    #[error("unregistered result class '{class}'")]
    UnregisteredClass {
        /// Class found on the wire.
        class: String,
    },

    /// The `details` section did not match the shape its class requires.
    #[error("invalid details for result class '{class}': {message}")]
    InvalidDetails {
        /// Class whose details failed to decode.
        class: String,
        /// Description of the mismatch.
        message: String,
    },

    /// A document could not be serialized.
    #[error("failed to serialize document: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl ProtocolError {
    /// Builds a [`ProtocolError::Malformed`] without an underlying JSON error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps a JSON parse failure.
    #[must_use]
    pub fn from_json_error(error: serde_json::Error) -> Self {
        Self::Malformed {
            message: error.to_string(),
            source: Some(error),
        }
    }
}
