//! Shared configuration for the remote command daemon and its client.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then a
//! `remotecmd.toml` file (located through `--config-path`,
//! `REMOTECMD_CONFIG_PATH`, or the usual discovery directories), then
//! `REMOTECMD_*` environment variables, then command-line flags.
//!
//! Command settings (config file paths, lock files, lifecycle scripts) are
//! optional at load time. Commands that need an unset value report it when
//! they execute, so a daemon serving only file operations does not have to
//! describe a web server it never touches.

mod cli_args;
mod defaults;
mod logging;
mod settings;
mod socket;

use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use cli_args::{CONFIG_CLI_FLAGS, ConfigArgumentSplit, split_config_arguments};
pub use defaults::{
    DEFAULT_IFUP_COMMAND, DEFAULT_LOCK_MAX_WAIT_SECS, DEFAULT_LOCK_POLL_INTERVAL_SECS,
    DEFAULT_LOG_FILTER, DEFAULT_NETWORK_SCRIPTS_DIR, DEFAULT_TCP_PORT, default_ifup_command,
    default_log_filter, default_log_filter_string, default_log_format,
    default_network_scripts_dir, default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use settings::{
    IpInstallerSettings, LockTimings, MissingSetting, ServerControlSettings,
    VirtualHostSettings,
};
pub use socket::{EndpointPart, SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved configuration shared by `remotecmdd` and `remotecmd`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "REMOTECMD",
    discovery(
        app_name = "remotecmd",
        env_var = "REMOTECMD_CONFIG_PATH",
        config_file_name = "remotecmd.toml",
        dotfile_name = ".remotecmd.toml",
        config_cli_long = "config-path"
    )
)]
pub struct Config {
    /// Endpoint the daemon listens on and the client connects to.
    #[ortho_config(default = default_socket_endpoint())]
    pub daemon_socket: SocketEndpoint,
    /// `tracing` filter directive.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Upper bound, in seconds, on waiting for a resource lock.
    #[ortho_config(default = DEFAULT_LOCK_MAX_WAIT_SECS)]
    pub lock_max_wait_secs: u64,
    /// Pause, in seconds, between lock acquisition attempts.
    #[ortho_config(default = DEFAULT_LOCK_POLL_INTERVAL_SECS)]
    pub lock_poll_interval_secs: u64,
    /// Web server configuration file holding the managed virtual hosts.
    pub vhost_config_file: Option<Utf8PathBuf>,
    /// Lock file guarding edits of `vhost_config_file`.
    pub vhost_lock_file: Option<Utf8PathBuf>,
    /// Command run after the virtual host file is rewritten.
    pub vhost_restart_command: Option<String>,
    /// Lock file guarding server lifecycle transitions.
    pub server_lock_file: Option<Utf8PathBuf>,
    /// Command that starts the managed server.
    pub server_start_command: Option<String>,
    /// Command that asks the managed server to stop.
    pub server_stop_command: Option<String>,
    /// Command that forcibly kills the managed server.
    pub server_kill_command: Option<String>,
    /// Command printing output only while the managed server runs.
    pub server_check_command: Option<String>,
    /// Directory holding `ifcfg-*` interface scripts.
    #[ortho_config(default = default_network_scripts_dir())]
    pub network_scripts_dir: Utf8PathBuf,
    /// Command used to bring up a new interface alias.
    #[ortho_config(default = default_ifup_command())]
    pub ifup_command: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon_socket: default_socket_endpoint(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            lock_max_wait_secs: DEFAULT_LOCK_MAX_WAIT_SECS,
            lock_poll_interval_secs: DEFAULT_LOCK_POLL_INTERVAL_SECS,
            vhost_config_file: None,
            vhost_lock_file: None,
            vhost_restart_command: None,
            server_lock_file: None,
            server_start_command: None,
            server_stop_command: None,
            server_kill_command: None,
            server_check_command: None,
            network_scripts_dir: default_network_scripts_dir(),
            ifup_command: default_ifup_command(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer fails to parse.
    pub fn load_from_env() -> Result<Self, Arc<OrthoError>> {
        Self::load()
    }

    /// Loads configuration from explicit arguments and the environment.
    ///
    /// `args` must start with the program name and hold only configuration
    /// flags; see [`split_config_arguments`].
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer fails to parse.
    pub fn load_from_args<I>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = std::ffi::OsString>,
    {
        Self::load_from_iter(args)
    }

    /// Endpoint the daemon binds to.
    #[must_use]
    pub fn daemon_socket(&self) -> &SocketEndpoint {
        &self.daemon_socket
    }

    /// `tracing` filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Lock wait budget and polling cadence.
    #[must_use]
    pub const fn lock_timings(&self) -> LockTimings {
        LockTimings {
            max_wait: Duration::from_secs(self.lock_max_wait_secs),
            poll_interval: Duration::from_secs(self.lock_poll_interval_secs),
        }
    }

    /// Settings consumed by the virtual host editor.
    #[must_use]
    pub fn virtual_host_settings(&self) -> VirtualHostSettings {
        VirtualHostSettings {
            config_file: self.vhost_config_file.clone(),
            lock_file: self.vhost_lock_file.clone(),
            restart_command: self.vhost_restart_command.clone(),
        }
    }

    /// Settings consumed by the server lifecycle controller.
    #[must_use]
    pub fn server_control_settings(&self) -> ServerControlSettings {
        ServerControlSettings {
            lock_file: self.server_lock_file.clone(),
            start_command: self.server_start_command.clone(),
            stop_command: self.server_stop_command.clone(),
            kill_command: self.server_kill_command.clone(),
            check_command: self.server_check_command.clone(),
        }
    }

    /// Settings consumed by the IP address installer.
    #[must_use]
    pub fn ip_installer_settings(&self) -> IpInstallerSettings {
        IpInstallerSettings {
            scripts_dir: self.network_scripts_dir.clone(),
            ifup_command: self.ifup_command.clone(),
        }
    }
}
