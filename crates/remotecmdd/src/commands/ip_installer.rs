//! Adds IP address aliases to the primary network interface.
//!
//! Each address gets the next free `eth0:N` alias. Its interface script is
//! derived from `ifcfg-eth0` by substituting the `DEVICE` and `IPADDR` lines,
//! after which the alias is brought up with the configured `ifup` command.

use std::fs;
use std::sync::Arc;

use camino::Utf8Path;
use remotecmd_config::IpInstallerSettings;
use remotecmd_protocol::{CommandResult, ProcessorArguments};
use tracing::info;

use crate::dispatch::{Command, CommandError};
use crate::exec::CommandRunner;

use super::{CommandContext, required_values, run_checked};

const IP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::ip");

const BASE_INTERFACE: &str = "eth0";
const SCRIPT_PREFIX: &str = "ifcfg-";

/// Installs interface aliases for the given addresses.
pub struct IpAddressInstaller {
    settings: IpInstallerSettings,
    runner: Arc<dyn CommandRunner>,
    addresses: Vec<String>,
}

impl IpAddressInstaller {
    /// Builds an installer from the shared context.
    #[must_use]
    pub fn new(context: &CommandContext) -> Self {
        Self {
            settings: context.ip_installer.clone(),
            runner: Arc::clone(&context.runner),
            addresses: Vec::new(),
        }
    }

    fn install(&self, address: &str) -> Result<(), CommandError> {
        let scripts_dir = self.settings.scripts_dir.as_path();
        let device = format!("{BASE_INTERFACE}:{}", next_alias(scripts_dir)?);
        let base_script = scripts_dir.join(format!("{SCRIPT_PREFIX}{BASE_INTERFACE}"));
        let template = fs::read_to_string(&base_script).map_err(|error| {
            CommandError::io(
                format!("failed to read {base_script}"),
                base_script.as_std_path(),
                &error,
            )
        })?;

        let alias_script = scripts_dir.join(format!("{SCRIPT_PREFIX}{device}"));
        fs::write(&alias_script, alias_script_for(&template, &device, address)).map_err(
            |error| {
                CommandError::io(
                    format!("failed to write {alias_script}"),
                    alias_script.as_std_path(),
                    &error,
                )
            },
        )?;

        let command_line = format!("{} {device} boot", self.settings.ifup_command);
        run_checked(self.runner.as_ref(), &command_line)?;
        info!(target: IP_TARGET, device = %device, address, "interface alias installed");
        Ok(())
    }
}

/// One past the highest existing `eth0` alias; the bare interface counts as -1.
pub(crate) fn next_alias(scripts_dir: &Utf8Path) -> Result<u32, CommandError> {
    let prefix = format!("{SCRIPT_PREFIX}{BASE_INTERFACE}");
    let entries = scripts_dir.read_dir_utf8().map_err(|error| {
        CommandError::io(
            format!("failed to list {scripts_dir}"),
            scripts_dir.as_std_path(),
            &error,
        )
    })?;

    let mut highest: Option<u32> = None;
    for entry in entries.flatten() {
        let Some(suffix) = entry.file_name().strip_prefix(prefix.as_str()) else {
            continue;
        };
        if let Some(alias) = suffix.strip_prefix(':').and_then(|n| n.parse::<u32>().ok()) {
            highest = Some(highest.map_or(alias, |current| current.max(alias)));
        }
    }
    match highest {
        None => Ok(0),
        Some(alias) => alias.checked_add(1).ok_or_else(|| {
            CommandError::resource(format!(
                "no alias left for {BASE_INTERFACE} after {BASE_INTERFACE}:{alias}"
            ))
        }),
    }
}

/// Interface script for `device` built from the base interface script.
pub(crate) fn alias_script_for(template: &str, device: &str, address: &str) -> String {
    template
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.starts_with("DEVICE") {
                format!("DEVICE={device}\n")
            } else if line.starts_with("IPADDR") {
                format!("IPADDR={address}\n")
            } else {
                format!("{line}\n")
            }
        })
        .collect()
}

impl Command for IpAddressInstaller {
    fn init(&mut self, arguments: &ProcessorArguments) -> Result<(), CommandError> {
        self.addresses = required_values(arguments, "ip", "ip cannot be null or an empty string")?;
        if self.addresses.is_empty() {
            return Err(CommandError::validation("no ip addresses given"));
        }
        Ok(())
    }

    fn execute(&mut self) -> CommandResult {
        self.addresses
            .iter()
            .try_for_each(|address| self.install(address))
            .map_or_else(CommandError::into_result, |()| CommandResult::success())
    }
}
