//! Subprocess execution for configured lifecycle and reload commands.
//!
//! Command lines come from configuration and are split on whitespace; no
//! shell is involved, so quoting and redirection are not interpreted.

use std::io;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

const EXEC_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::exec");

/// Captured outcome of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was ended by a signal.
    pub status: Option<i32>,
    /// Standard output decoded lossily as UTF-8.
    pub stdout: String,
    /// Standard error decoded lossily as UTF-8.
    pub stderr: String,
}

impl ProcessOutput {
    /// `true` when the process exited with code zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Error lines followed by output lines, each terminated by `\r\n`.
    #[must_use]
    pub fn combined(&self) -> String {
        self.stderr
            .lines()
            .chain(self.stdout.lines())
            .fold(String::new(), |mut text, line| {
                text.push_str(line);
                text.push_str("\r\n");
                text
            })
    }
}

/// Errors raised before a subprocess produced an exit status.
#[derive(Debug, Error)]
pub enum RunError {
    /// The configured command line contained no program.
    #[error("command line is empty")]
    Empty,
    /// The program could not be started or waited on.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Runs a command line to completion and captures its output.
pub trait CommandRunner: Send + Sync {
    /// Runs `command_line`, blocking until it exits.
    fn run(&self, command_line: &str) -> Result<ProcessOutput, RunError>;
}

/// Runner backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command_line: &str) -> Result<ProcessOutput, RunError> {
        let mut words = command_line.split_whitespace();
        let program = words.next().ok_or(RunError::Empty)?;
        debug!(target: EXEC_TARGET, command = command_line, "running command");
        let output = Command::new(program)
            .args(words)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RunError::Spawn {
                program: program.to_owned(),
                source,
            })?;
        let captured = ProcessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(
            target: EXEC_TARGET,
            command = command_line,
            status = ?captured.status,
            "command finished"
        );
        Ok(captured)
    }
}
