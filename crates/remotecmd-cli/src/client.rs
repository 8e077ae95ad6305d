//! Request/response exchange with a remote command daemon.
//!
//! Each exchange opens a fresh connection, writes one request line, and
//! reads one result line back. The daemon closes the connection afterwards.

use std::io::{self, BufRead, BufReader, Write};

use remotecmd_config::SocketEndpoint;
use remotecmd_protocol::{
    CommandEnvelope, CommandResult, ProtocolError, ResultRegistry, TransportRequest,
    deserialize_result, serialize_envelope,
};
use thiserror::Error;

use crate::transport::connect;

/// Failures talking to the daemon.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The TCP host did not resolve to an address.
    #[error("failed to resolve daemon address {endpoint}: {source}")]
    Resolve {
        /// Endpoint being resolved.
        endpoint: String,
        /// Resolver error.
        source: io::Error,
    },
    /// No connection could be established within the timeout.
    #[error("failed to connect to daemon at {endpoint}: {source}")]
    Connect {
        /// Endpoint being dialled.
        endpoint: String,
        /// Connect error.
        source: io::Error,
    },
    /// Unix sockets are not available on this platform.
    #[cfg(not(unix))]
    #[error("platform does not support Unix sockets: {0}")]
    UnsupportedUnixTransport(String),
    /// The request could not be written.
    #[error("failed to send request to daemon: {0}")]
    SendRequest(#[source] io::Error),
    /// The response could not be read.
    #[error("failed to read response from daemon: {0}")]
    ReadResponse(#[source] io::Error),
    /// The daemon closed the connection without answering.
    #[error("daemon closed the connection without sending a result")]
    EmptyResponse,
    /// The request or response was not a valid wire document.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Client bound to one daemon endpoint.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    endpoint: SocketEndpoint,
    registry: ResultRegistry,
}

impl RemoteClient {
    /// Builds a client decoding results with the standard registry.
    #[must_use]
    pub fn new(endpoint: SocketEndpoint) -> Self {
        Self {
            endpoint,
            registry: ResultRegistry::standard(),
        }
    }

    /// Endpoint this client talks to.
    #[must_use]
    pub const fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Sends `envelope` and returns the daemon's result.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the exchange fails or the reply cannot be
    /// decoded. A command that ran and failed is an `Ok` failure result.
    pub fn send(&self, envelope: &CommandEnvelope) -> Result<CommandResult, ClientError> {
        let request = TransportRequest::processor(serialize_envelope(envelope)?);
        self.exchange(&request)
    }

    /// Probes the daemon without running a command.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the daemon cannot be reached or answers
    /// with something other than a result.
    pub fn test(&self) -> Result<CommandResult, ClientError> {
        self.exchange(&TransportRequest::probe())
    }

    fn exchange(&self, request: &TransportRequest) -> Result<CommandResult, ClientError> {
        let line = request.to_line()?;
        let mut connection = connect(&self.endpoint)?;
        connection
            .write_all(&line)
            .and_then(|()| connection.flush())
            .map_err(ClientError::SendRequest)?;

        let mut response = String::new();
        let read = BufReader::new(&mut connection)
            .read_line(&mut response)
            .map_err(ClientError::ReadResponse)?;
        if read == 0 || response.trim().is_empty() {
            return Err(ClientError::EmptyResponse);
        }
        Ok(deserialize_result(response.trim_end(), &self.registry)?)
    }
}
