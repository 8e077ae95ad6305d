//! Lifecycle control of the managed server process.
//!
//! Every transition except `check` runs under the server lock file. Stopping
//! asks nicely first and escalates to the kill command once the grace period
//! runs out.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use remotecmd_config::ServerControlSettings;
use remotecmd_protocol::{ArgumentNode, CommandResult, ProcessorArguments};
use tracing::{info, warn};

use crate::dispatch::{Command, CommandError};
use crate::exec::CommandRunner;
use crate::lock::{FileLock, LockOptions};

use super::{CommandContext, run_checked};

const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

const RUNNING: &str = "Server is running";
const NOT_RUNNING: &str = "Server is not running";

/// Lifecycle transition requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerAction {
    /// Launch the server.
    Start,
    /// Stop the server, killing it if it lingers.
    Stop,
    /// Stop then start under one lock.
    Restart,
    /// Report whether the server runs; never locks.
    Check,
}

impl ServerAction {
    /// Parses an action name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Validation`] for unrecognised names.
    pub fn parse(value: &str) -> Result<Self, CommandError> {
        match value.to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "restart" => Ok(Self::Restart),
            "check" => Ok(Self::Check),
            _ => Err(CommandError::validation(format!(
                "command {value} is invalid"
            ))),
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Check => "check",
        }
    }

    /// Argument list requesting this action from a remote daemon.
    #[must_use]
    pub fn to_arguments(self) -> ProcessorArguments {
        std::iter::once(ArgumentNode::leaf("command", self.as_str())).collect()
    }
}

/// How long a stop may take before the kill command is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopPolicy {
    /// Total time allowed for a graceful stop.
    pub grace: Duration,
    /// Pause between liveness checks.
    pub poll: Duration,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(15),
            poll: Duration::from_secs(1),
        }
    }
}

/// Starts, stops, restarts, or checks the managed server.
pub struct ServerControl {
    settings: ServerControlSettings,
    lock: LockOptions,
    stop_policy: StopPolicy,
    runner: Arc<dyn CommandRunner>,
    action: ServerAction,
}

impl ServerControl {
    /// Builds a controller from the shared context.
    #[must_use]
    pub fn new(context: &CommandContext) -> Self {
        Self {
            settings: context.server.clone(),
            lock: context.lock,
            stop_policy: context.stop_policy,
            runner: Arc::clone(&context.runner),
            action: ServerAction::Check,
        }
    }

    fn run(&self) -> Result<CommandResult, CommandError> {
        if self.action == ServerAction::Check {
            let reason = if self.is_running()? { RUNNING } else { NOT_RUNNING };
            return Ok(CommandResult::success().with_reason(reason));
        }

        let lock_file = self.settings.lock_file()?;
        let _lock = FileLock::acquire(lock_file.as_std_path(), &owner_token(), &self.lock)?;
        match self.action {
            ServerAction::Start => self.start()?,
            ServerAction::Stop => self.stop()?,
            ServerAction::Restart => {
                self.stop()?;
                self.start()?;
            }
            ServerAction::Check => {}
        }
        Ok(CommandResult::success())
    }

    fn is_running(&self) -> Result<bool, CommandError> {
        let command_line = self.settings.check_command()?;
        let output = self
            .runner
            .run(command_line)
            .map_err(|error| CommandError::spawn(command_line, &error))?;
        Ok(!output.stdout.trim().is_empty())
    }

    fn start(&self) -> Result<(), CommandError> {
        run_checked(self.runner.as_ref(), self.settings.start_command()?)?;
        info!(target: SERVER_TARGET, "server started");
        Ok(())
    }

    fn stop(&self) -> Result<(), CommandError> {
        run_checked(self.runner.as_ref(), self.settings.stop_command()?)?;

        let started = Instant::now();
        while self.is_running()? {
            if started.elapsed() >= self.stop_policy.grace {
                return self.kill();
            }
            thread::sleep(self.stop_policy.poll);
        }
        info!(target: SERVER_TARGET, "server stopped");
        Ok(())
    }

    fn kill(&self) -> Result<(), CommandError> {
        let command_line = self.settings.kill_command()?;
        warn!(
            target: SERVER_TARGET,
            grace_ms = self.stop_policy.grace.as_millis(),
            "server still running after grace period; killing"
        );
        let output = self
            .runner
            .run(command_line)
            .map_err(|error| CommandError::spawn(command_line, &error))?;
        if !output.success() {
            warn!(
                target: SERVER_TARGET,
                status = ?output.status,
                "kill command reported failure"
            );
        }
        Ok(())
    }
}

fn owner_token() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
        .to_string()
}

impl Command for ServerControl {
    fn init(&mut self, arguments: &ProcessorArguments) -> Result<(), CommandError> {
        let value = arguments
            .value_of("command")
            .ok_or_else(|| CommandError::validation("command not set"))?;
        self.action = ServerAction::parse(value)?;
        Ok(())
    }

    fn execute(&mut self) -> CommandResult {
        self.run().unwrap_or_else(CommandError::into_result)
    }
}
