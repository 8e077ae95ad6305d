//! JSONL framing for the socket exchange.
//!
//! The client writes exactly one request line and the daemon answers with one
//! line holding a serialized [`CommandResult`](crate::CommandResult). A
//! request either carries a serialized envelope in its `processor` field or
//! is a reachability probe of the form `{"test":"1"}`.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Value sent in the `test` field of a probe request.
pub const PROBE_VALUE: &str = "1";

/// One request line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransportRequest {
    /// Run the command described by the serialized envelope.
    Processor {
        /// Serialized [`CommandEnvelope`](crate::CommandEnvelope).
        processor: String,
    },
    /// Liveness probe; nothing is dispatched.
    Test {
        /// Always [`PROBE_VALUE`] when sent by this crate's callers.
        test: String,
    },
}

impl TransportRequest {
    /// Wraps serialized envelope text.
    #[must_use]
    pub fn processor(envelope_text: impl Into<String>) -> Self {
        Self::Processor {
            processor: envelope_text.into(),
        }
    }

    /// Builds a liveness probe.
    #[must_use]
    pub fn probe() -> Self {
        Self::Test {
            test: PROBE_VALUE.to_owned(),
        }
    }

    /// Encodes the request as a newline-terminated line.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Serialize`] if encoding fails.
    pub fn to_line(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut line = serde_json::to_vec(self).map_err(ProtocolError::Serialize)?;
        line.push(b'\n');
        Ok(line)
    }

    /// Parses a request line. Trailing whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Malformed`] for empty lines or JSON matching
    /// neither request shape.
    pub fn parse_line(line: &[u8]) -> Result<Self, ProtocolError> {
        let trimmed = line.trim_ascii_end();
        if trimmed.is_empty() {
            return Err(ProtocolError::malformed("empty request line"));
        }
        serde_json::from_slice(trimmed).map_err(ProtocolError::from_json_error)
    }
}
