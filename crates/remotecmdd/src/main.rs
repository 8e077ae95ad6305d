//! Entry point for the remote command daemon.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    remotecmdd::run(std::env::args_os(), &mut stdout, &mut stderr)
}
