//! Socket transport for the daemon.
//!
//! The listener binds the configured endpoint and serves every accepted
//! connection on its own thread. A connection carries exactly one request
//! line and receives exactly one response line.

mod errors;
mod handler;
mod listener;

pub use self::errors::ListenerError;
pub(crate) use self::handler::{
    ConnectionHandler, ConnectionStream, RequestReadError, read_request_line,
};
pub(crate) use self::listener::SocketListener;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
