//! The contract every dispatchable command implements.

use remotecmd_protocol::{CommandResult, ProcessorArguments};

use super::errors::CommandError;

/// A named operation executed on behalf of a remote caller.
///
/// The dispatcher builds a fresh instance per request, calls [`init`] once
/// with the request arguments, and calls [`execute`] only when `init`
/// succeeded.
///
/// [`init`]: Command::init
/// [`execute`]: Command::execute
pub trait Command: Send {
    /// Validates and captures the arguments.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Validation`] when required arguments are
    /// missing or malformed. No side effects happen before `execute`.
    fn init(&mut self, arguments: &ProcessorArguments) -> Result<(), CommandError>;

    /// Performs the operation.
    ///
    /// Failures are reported through the returned result, never by
    /// panicking.
    fn execute(&mut self) -> CommandResult;
}

/// Builds a new, uninitialised command instance.
pub type CommandFactory = Box<dyn Fn() -> Box<dyn Command> + Send + Sync>;
