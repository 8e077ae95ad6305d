//! Request envelope naming the command to run and its arguments.

use serde::{Deserialize, Serialize};

use crate::arguments::ProcessorArguments;

/// Caller credentials. Carried on the wire but never checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account name; empty when the caller supplied none.
    #[serde(default)]
    pub username: String,
    /// Account secret; empty when the caller supplied none.
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    /// Builds credentials from a name and secret.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// A single command request.
///
/// The envelope is built once by the caller and read-only afterwards; the
/// receiving side only borrows its parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(flatten)]
    credentials: Credentials,
    #[serde(rename = "type")]
    command_type: String,
    #[serde(rename = "processor-arguments", default)]
    arguments: ProcessorArguments,
}

impl CommandEnvelope {
    /// Wraps arguments for the command identified by `command_type`.
    #[must_use]
    pub fn new(
        credentials: Credentials,
        command_type: impl Into<String>,
        arguments: ProcessorArguments,
    ) -> Self {
        Self {
            credentials,
            command_type: command_type.into(),
            arguments,
        }
    }

    /// Caller credentials.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Identifier of the command implementation to run.
    #[must_use]
    pub fn command_type(&self) -> &str {
        &self.command_type
    }

    /// Argument tree handed to the command.
    #[must_use]
    pub const fn arguments(&self) -> &ProcessorArguments {
        &self.arguments
    }

    /// Splits the envelope into its command type and arguments.
    #[must_use]
    pub fn into_parts(self) -> (String, ProcessorArguments) {
        (self.command_type, self.arguments)
    }
}
