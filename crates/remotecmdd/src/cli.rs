//! Command-line surface of the `remotecmdd` binary.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use remotecmd_config::split_config_arguments;
use remotecmd_protocol::render_report;

use crate::bootstrap::SystemConfigLoader;
use crate::health::StructuredHealthReporter;
use crate::local::execute_local;
use crate::process::run_daemon;

/// Remote command daemon.
#[derive(Parser, Debug)]
#[command(name = "remotecmdd", disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<DaemonCommand>,
}

#[derive(Subcommand, Debug)]
enum DaemonCommand {
    /// Serves requests on the configured socket until signalled (default).
    Serve,
    /// Runs one command locally and prints its result.
    Exec {
        /// Command type identifier, for example `remotecmd.FileLister`.
        #[arg(value_name = "TYPE")]
        type_id: String,
        /// JSON file holding the argument nodes.
        #[arg(value_name = "ARGUMENT_FILE")]
        argument_file: Utf8PathBuf,
    },
}

/// Parses `args` and runs the selected mode.
///
/// Configuration flags such as `--config-path` must precede the subcommand.
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
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
    let loader = SystemConfigLoader::new(split.config_arguments);

    match cli.command.unwrap_or(DaemonCommand::Serve) {
        DaemonCommand::Serve => match run_daemon(loader) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                let _ = writeln!(stderr, "remotecmdd: {error}");
                ExitCode::FAILURE
            }
        },
        DaemonCommand::Exec {
            type_id,
            argument_file,
        } => {
            let reporter = Arc::new(StructuredHealthReporter::new());
            match execute_local(&loader, reporter, &type_id, &argument_file) {
                Ok(result) => {
                    let _ = stdout.write_all(render_report(&result).as_bytes());
                    if result.is_success() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                Err(error) => {
                    let _ = writeln!(stderr, "remotecmdd: {error}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
