//! CLI entrypoint for sending commands to a remote command daemon.
//!
//! The binary delegates to [`remotecmd_cli::run`], which loads
//! configuration, reads the argument file, and exchanges one request with
//! the configured daemon endpoint.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    remotecmd_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
