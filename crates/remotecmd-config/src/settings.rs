//! Typed views over the command-specific configuration fields.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Raised when a command needs a setting that was never configured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("required setting '{setting}' is not configured")]
pub struct MissingSetting {
    /// Configuration key that was absent.
    pub setting: &'static str,
}

fn require<'a, T: ?Sized>(
    value: Option<&'a T>,
    setting: &'static str,
) -> Result<&'a T, MissingSetting> {
    value.ok_or(MissingSetting { setting })
}

/// Lock wait budget and polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockTimings {
    /// Total time an acquisition may wait.
    pub max_wait: Duration,
    /// Pause between attempts.
    pub poll_interval: Duration,
}

/// Settings for the virtual host editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualHostSettings {
    pub config_file: Option<Utf8PathBuf>,
    pub lock_file: Option<Utf8PathBuf>,
    pub restart_command: Option<String>,
}

impl VirtualHostSettings {
    /// Path of the managed web server configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`MissingSetting`] when `vhost_config_file` is unset.
    pub fn config_file(&self) -> Result<&Utf8Path, MissingSetting> {
        require(self.config_file.as_deref(), "vhost_config_file")
    }

    /// Path of the lock file guarding the configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`MissingSetting`] when `vhost_lock_file` is unset.
    pub fn lock_file(&self) -> Result<&Utf8Path, MissingSetting> {
        require(self.lock_file.as_deref(), "vhost_lock_file")
    }

    /// Command reloading the web server.
    ///
    /// # Errors
    ///
    /// Returns [`MissingSetting`] when `vhost_restart_command` is unset.
    pub fn restart_command(&self) -> Result<&str, MissingSetting> {
        require(self.restart_command.as_deref(), "vhost_restart_command")
    }
}

/// Settings for the server lifecycle controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerControlSettings {
    pub lock_file: Option<Utf8PathBuf>,
    pub start_command: Option<String>,
    pub stop_command: Option<String>,
    pub kill_command: Option<String>,
    pub check_command: Option<String>,
}

impl ServerControlSettings {
    /// # Errors
    ///
    /// Returns [`MissingSetting`] when `server_lock_file` is unset.
    pub fn lock_file(&self) -> Result<&Utf8Path, MissingSetting> {
        require(self.lock_file.as_deref(), "server_lock_file")
    }

    /// # Errors
    ///
    /// Returns [`MissingSetting`] when `server_start_command` is unset.
    pub fn start_command(&self) -> Result<&str, MissingSetting> {
        require(self.start_command.as_deref(), "server_start_command")
    }

    /// # Errors
    ///
    /// Returns [`MissingSetting`] when `server_stop_command` is unset.
    pub fn stop_command(&self) -> Result<&str, MissingSetting> {
        require(self.stop_command.as_deref(), "server_stop_command")
    }

    /// # Errors
    ///
    /// Returns [`MissingSetting`] when `server_kill_command` is unset.
    pub fn kill_command(&self) -> Result<&str, MissingSetting> {
        require(self.kill_command.as_deref(), "server_kill_command")
    }

    /// # Errors
    ///
    /// Returns [`MissingSetting`] when `server_check_command` is unset.
    pub fn check_command(&self) -> Result<&str, MissingSetting> {
        require(self.check_command.as_deref(), "server_check_command")
    }
}

/// Settings for the IP address installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpInstallerSettings {
    /// Directory holding the `ifcfg-*` scripts.
    pub scripts_dir: Utf8PathBuf,
    /// Command prefix used to bring up the new alias.
    pub ifup_command: String,
}
