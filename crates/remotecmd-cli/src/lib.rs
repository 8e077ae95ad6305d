//! Client runtime for the remote command daemon.
//!
//! The crate exposes [`RemoteClient`] for programmatic use and [`run`] for
//! the `remotecmd` binary. The runtime splits configuration flags from the
//! subcommand, loads configuration, performs one exchange with the daemon,
//! and prints the result as a short report.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::process::ExitCode;

use camino::Utf8Path;
use clap::Parser;
use remotecmd_config::{Config, split_config_arguments};
use remotecmd_protocol::{
    CommandEnvelope, CommandResult, Credentials, ProcessorArguments, parse_arguments,
    render_report,
};

mod cli;
mod client;
mod config;
mod errors;
mod transport;

pub use client::{ClientError, RemoteClient};

use cli::{Cli, CliCommand};
use config::{ConfigLoader, OrthoConfigLoader};
use errors::AppError;

/// Runs the CLI using the provided arguments and IO handles.
///
/// The exit code is non-zero when the daemon could not be reached or
/// reported a failed result.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);
    let cli = match Cli::try_parse_from(&split.command_arguments) {
        Ok(cli) => cli,
        Err(error) if error.use_stderr() => {
            let _ = write!(stderr, "{error}");
            return ExitCode::FAILURE;
        }
        Err(error) => {
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
    };

    let outcome = loader
        .load(&split.config_arguments)
        .and_then(|config| execute(&config, cli.command))
        .and_then(|result| {
            stdout
                .write_all(render_report(&result).as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(AppError::WriteReport)?;
            Ok(result)
        });

    match outcome {
        Ok(result) if result.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(error) => {
            let _ = writeln!(stderr, "remotecmd: {error}");
            ExitCode::FAILURE
        }
    }
}

fn execute(config: &Config, command: CliCommand) -> Result<CommandResult, AppError> {
    let client = RemoteClient::new(config.daemon_socket().clone());
    match command {
        CliCommand::Test => Ok(client.test()?),
        CliCommand::Send {
            type_id,
            argument_file,
            username,
            password,
        } => {
            let arguments = read_arguments(&argument_file)?;
            let envelope =
                CommandEnvelope::new(Credentials::new(username, password), type_id, arguments);
            Ok(client.send(&envelope)?)
        }
    }
}

fn read_arguments(path: &Utf8Path) -> Result<ProcessorArguments, AppError> {
    let text = fs::read_to_string(path).map_err(|source| AppError::ReadArguments {
        path: path.to_path_buf(),
        source,
    })?;
    parse_arguments(&text).map_err(|source| AppError::ParseArguments {
        path: path.to_path_buf(),
        source,
    })
}
