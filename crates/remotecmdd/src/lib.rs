//! Remote command daemon.
//!
//! `remotecmdd` listens on the configured socket for JSONL requests. Each
//! request names a command type (`remotecmd.ServerControl`,
//! `remotecmd.FileLister`, ...) and carries an argument tree; the daemon
//! resolves the type through an explicit [`CommandRegistry`], validates the
//! arguments, runs the command, and answers with a single serialized
//! [`remotecmd_protocol::CommandResult`].
//!
//! Commands that touch shared resources (the web server configuration file,
//! the managed server process) serialise through [`lock::FileLock`], which
//! excludes both other threads and other processes.
//!
//! The same commands can be run in-process with `remotecmdd exec`, which
//! reads the argument tree from a file and prints the result.

mod bootstrap;
mod cli;
pub mod commands;
pub mod dispatch;
pub mod exec;
mod health;
mod local;
pub mod lock;
mod process;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use cli::run;
pub use dispatch::{CommandRegistry, Dispatcher};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use local::{LocalRunError, execute_local};
pub use process::{LaunchError, run_daemon};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
