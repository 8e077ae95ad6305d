//! One-shot local invocation of a command, bypassing the socket.

use std::fs;
use std::io;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoError;
use remotecmd_protocol::{CommandResult, ProtocolError, parse_arguments};
use thiserror::Error;

use crate::bootstrap::ConfigLoader;
use crate::commands::CommandContext;
use crate::dispatch::{CommandRegistry, Dispatcher};
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError};

/// Failures that prevent a local invocation from reaching the command.
#[derive(Debug, Error)]
pub enum LocalRunError {
    /// The argument file could not be read.
    #[error("failed to read argument file {path}: {source}")]
    ReadArguments {
        /// Argument file path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The argument file is not a valid argument document.
    #[error("invalid argument file {path}: {source}")]
    ParseArguments {
        /// Argument file path.
        path: Utf8PathBuf,
        /// Decoder error.
        #[source]
        source: ProtocolError,
    },
    /// Configuration failed to load.
    #[error("failed to load configuration: {0}")]
    Configuration(Arc<OrthoError>),
    /// Telemetry initialisation failed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Runs `type_id` in-process with arguments read from `argument_file`.
///
/// # Errors
///
/// Returns [`LocalRunError`] when the arguments or configuration cannot be
/// loaded. Command failures are reported through the returned result.
pub fn execute_local(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    type_id: &str,
    argument_file: &Utf8Path,
) -> Result<CommandResult, LocalRunError> {
    let text = fs::read_to_string(argument_file).map_err(|source| {
        LocalRunError::ReadArguments {
            path: argument_file.to_path_buf(),
            source,
        }
    })?;
    let arguments = parse_arguments(&text).map_err(|source| LocalRunError::ParseArguments {
        path: argument_file.to_path_buf(),
        source,
    })?;

    let config = loader.load().map_err(LocalRunError::Configuration)?;
    telemetry::initialise(&config)?;

    let registry = CommandRegistry::standard(CommandContext::from_config(&config));
    Ok(Dispatcher::new(registry, reporter).dispatch(type_id, &arguments))
}
