//! Connection handler answering one request line with one result line.
//!
//! A probe (`{"test":"1"}`) is answered with a successful result without
//! touching the dispatcher. A processor request carries a serialized
//! envelope, which is decoded and dispatched. Anything the daemon cannot
//! understand is still answered with a failed result so that clients always
//! receive a well-formed reply when the connection survives.

use std::io::Write;

use remotecmd_protocol::{CommandResult, TransportRequest, deserialize_envelope, serialize_result};
use tracing::{debug, warn};

use crate::transport::{ConnectionHandler, ConnectionStream, RequestReadError, read_request_line};

use super::DISPATCH_TARGET;
use super::dispatcher::Dispatcher;

/// Maximum size of a single request line in bytes.
pub(crate) const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Handler that routes socket requests to a [`Dispatcher`].
pub struct ProcessorConnectionHandler {
    dispatcher: Dispatcher,
}

impl ProcessorConnectionHandler {
    /// Wraps `dispatcher`.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Computes the reply for one raw request line.
    pub(crate) fn respond(&self, line: &[u8]) -> CommandResult {
        let request = match TransportRequest::parse_line(line) {
            Ok(request) => request,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "malformed request");
                return CommandResult::failure(format!("invalid request: {error}"));
            }
        };

        match request {
            TransportRequest::Test { .. } => {
                debug!(target: DISPATCH_TARGET, "probe received");
                CommandResult::success()
            }
            TransportRequest::Processor { processor } => match deserialize_envelope(&processor) {
                Ok(envelope) => {
                    debug!(
                        target: DISPATCH_TARGET,
                        type_id = envelope.command_type(),
                        username = envelope.credentials().username.as_str(),
                        arguments = envelope.arguments().len(),
                        "dispatching request"
                    );
                    self.dispatcher
                        .dispatch(envelope.command_type(), envelope.arguments())
                }
                Err(error) => {
                    warn!(target: DISPATCH_TARGET, %error, "malformed envelope");
                    CommandResult::failure(format!("invalid envelope: {error}"))
                }
            },
        }
    }

    fn serve(&self, stream: &mut ConnectionStream) {
        let result = match read_request_line(stream, MAX_REQUEST_BYTES) {
            Ok(Some(line)) => self.respond(&line),
            Ok(None) => {
                debug!(target: DISPATCH_TARGET, "client disconnected without request");
                return;
            }
            Err(RequestReadError::TooLarge { limit }) => {
                warn!(target: DISPATCH_TARGET, limit, "request too large");
                CommandResult::failure(format!("request exceeds {limit} byte limit"))
            }
            Err(RequestReadError::Io(error)) => {
                warn!(target: DISPATCH_TARGET, %error, "failed to read request");
                return;
            }
        };
        write_result(stream, &result);
    }
}

impl ConnectionHandler for ProcessorConnectionHandler {
    fn handle(&self, mut stream: ConnectionStream) {
        self.serve(&mut stream);
    }
}

fn write_result(stream: &mut ConnectionStream, result: &CommandResult) {
    let mut line = match serialize_result(result) {
        Ok(text) => text,
        Err(error) => {
            warn!(target: DISPATCH_TARGET, %error, "failed to serialize result");
            return;
        }
    };
    line.push('\n');
    if let Err(error) = stream
        .write_all(line.as_bytes())
        .and_then(|()| stream.flush())
    {
        warn!(target: DISPATCH_TARGET, %error, "failed to write result");
    }
}
