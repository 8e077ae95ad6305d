//! Command dispatch for requests arriving over the daemon socket.
//!
//! A request names a command type and carries its arguments:
//!
//! ```json
//! {"processor":"{\"type\":\"remotecmd.ServerControl\",\"processor-arguments\":[{\"name\":\"command\",\"value\":\"check\"}]}"}
//! ```
//!
//! The type identifier is looked up in an explicit [`CommandRegistry`]; the
//! [`Dispatcher`] builds a fresh command, validates the arguments through
//! [`Command::init`], and returns whatever [`Command::execute`] produces.
//! Every outcome, including unknown types and malformed requests, is
//! answered with a single serialized result line.

mod command;
mod dispatcher;
mod errors;
mod handler;
mod registry;

pub use self::command::{Command, CommandFactory};
pub use self::dispatcher::Dispatcher;
pub use self::errors::CommandError;
pub use self::handler::ProcessorConnectionHandler;
pub use self::registry::{CommandRegistry, DuplicateCommand};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
