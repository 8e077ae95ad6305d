//! Separates configuration flags from subcommand tokens.
//!
//! Both binaries accept the loader's own flags ahead of their subcommand:
//!
//! ```text
//! remotecmd --daemon-socket tcp://10.0.0.5:9779 send remotecmd.FileLister args.json
//! ```
//!
//! Only the leading run of recognised flags is handed to [`crate::Config`];
//! everything from the first other token onwards belongs to the command
//! parser.

use std::ffi::OsString;

/// Flags understood by the configuration loader.
pub const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--daemon-socket",
    "--log-filter",
    "--log-format",
    "--lock-max-wait-secs",
    "--lock-poll-interval-secs",
];

/// Arguments split into the loader's share and the command's share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigArgumentSplit {
    /// Program name followed by the leading configuration flags.
    pub config_arguments: Vec<OsString>,
    /// Program name followed by everything after the configuration flags.
    pub command_arguments: Vec<OsString>,
}

/// Splits `args` (including the program name) at the first token that is
/// not a recognised configuration flag or its value.
#[must_use]
pub fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_arguments: Vec::new(),
        };
    };

    let mut config_arguments = vec![program.clone()];
    let mut index = 0;
    while let Some(argument) = rest.get(index) {
        let Some(needs_value) = config_flag(argument) else {
            break;
        };
        config_arguments.push(argument.clone());
        index += 1;
        if needs_value && let Some(value) = rest.get(index) {
            config_arguments.push(value.clone());
            index += 1;
        }
    }

    let command_arguments = std::iter::once(program.clone())
        .chain(rest[index..].iter().cloned())
        .collect();
    ConfigArgumentSplit {
        config_arguments,
        command_arguments,
    }
}

/// `Some(needs_value)` for a configuration flag, `None` otherwise.
fn config_flag(argument: &OsString) -> Option<bool> {
    let text = argument.to_str()?;
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text, false),
    };
    CONFIG_CLI_FLAGS.contains(&flag).then_some(!inline_value)
}
