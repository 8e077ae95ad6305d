//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use remotecmd_protocol::ProtocolError;
use thiserror::Error;

use crate::client::ClientError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("failed to read argument file {path}: {source}")]
    ReadArguments { path: Utf8PathBuf, source: io::Error },
    #[error("invalid argument file {path}: {source}")]
    ParseArguments {
        path: Utf8PathBuf,
        source: ProtocolError,
    },
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to write report: {0}")]
    WriteReport(io::Error),
}
