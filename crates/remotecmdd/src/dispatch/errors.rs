//! Error types raised while preparing or executing a command.
//!
//! Every variant ends up on the wire as a failed [`CommandResult`]; nothing
//! here escapes the dispatcher as a Rust error.

use std::error::Error as StdError;
use std::io;
use std::path::Path;

use remotecmd_config::MissingSetting;
use remotecmd_protocol::CommandResult;
use thiserror::Error;

use crate::exec::{ProcessOutput, RunError};
use crate::lock::LockError;

/// Failures surfaced by [`Command`](super::Command) implementations.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Arguments were missing or malformed.
    #[error("{message}")]
    Validation {
        /// Human-readable description.
        message: String,
    },

    /// A file, directory, or subprocess did not behave as required.
    #[error("{message}")]
    Resource {
        /// Human-readable description.
        message: String,
        /// Diagnostic detail such as the underlying IO error.
        trace: Option<String>,
    },

    /// The protecting lock could not be taken.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// A setting the command needs was never configured.
    #[error(transparent)]
    Unconfigured(#[from] MissingSetting),
}

impl CommandError {
    /// Builds a [`CommandError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Builds a [`CommandError::Resource`] without a trace.
    pub fn resource(message: impl Into<String>) -> Self {
        Self::Resource {
            message: message.into(),
            trace: None,
        }
    }

    /// Wraps an IO error raised while touching `path`.
    pub fn io(message: impl Into<String>, path: &Path, source: &io::Error) -> Self {
        Self::Resource {
            message: message.into(),
            trace: Some(format!("{}: {source}", path.display())),
        }
    }

    /// Wraps a subprocess that could not be started.
    pub fn spawn(command_line: &str, source: &RunError) -> Self {
        Self::Resource {
            message: source.to_string(),
            trace: Some(format!("command: {command_line}")),
        }
    }

    /// Wraps a subprocess that exited unsuccessfully.
    ///
    /// The reason is the captured output, error lines first; when the
    /// process printed nothing the exit status is reported instead.
    pub fn exited(command_line: &str, output: &ProcessOutput) -> Self {
        let status = output
            .status
            .map_or_else(|| "a signal".to_owned(), |code| format!("status {code}"));
        let combined = output.combined();
        let message = if combined.is_empty() {
            format!("command '{command_line}' exited with {status}")
        } else {
            combined
        };
        Self::Resource {
            message,
            trace: Some(format!("command '{command_line}' exited with {status}")),
        }
    }

    /// Diagnostic detail sent alongside the reason.
    ///
    /// Argument rejections carry none; every other variant describes where
    /// the failure came from.
    #[must_use]
    pub fn trace(&self) -> Option<String> {
        match self {
            Self::Validation { .. } => None,
            Self::Resource { trace, .. } => trace.clone(),
            Self::Lock(LockError::Timeout { path, waited }) => Some(format!(
                "lock file {} still present after waiting {}ms",
                path.display(),
                waited.as_millis()
            )),
            Self::Lock(error @ LockError::Io { path, .. }) => {
                Some(format!("{}: {}", path.display(), source_chain(error)))
            }
            Self::Unconfigured(missing) => Some(format!(
                "setting '{}' is absent from defaults, files, environment, and flags",
                missing.setting
            )),
        }
    }

    /// Converts the error into the failed result sent to the caller.
    #[must_use]
    pub fn into_result(self) -> CommandResult {
        let result = CommandResult::failure(self.to_string());
        match self.trace() {
            Some(trace) => result.with_trace(trace),
            None => result,
        }
    }
}

/// Joins the sources below `error` into one line, outermost first.
fn source_chain(error: &dyn StdError) -> String {
    let mut chain = Vec::new();
    let mut current = error.source();
    while let Some(source) = current {
        chain.push(source.to_string());
        current = source.source();
    }
    if chain.is_empty() {
        error.to_string()
    } else {
        chain.join(": ")
    }
}
