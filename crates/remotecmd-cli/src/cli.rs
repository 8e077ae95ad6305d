//! CLI argument definitions for the `remotecmd` client.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Sends commands to a remote command daemon.
#[derive(Parser, Debug)]
#[command(name = "remotecmd", disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Runs a command on the daemon and prints its result.
    Send {
        /// Command type identifier, for example `remotecmd.FileLister`.
        #[arg(value_name = "TYPE")]
        type_id: String,
        /// JSON file holding the argument nodes.
        #[arg(value_name = "ARGUMENT_FILE")]
        argument_file: Utf8PathBuf,
        /// User name carried in the request.
        #[arg(long, default_value = "")]
        username: String,
        /// Password carried in the request.
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Checks that the daemon answers.
    Test,
}
