use camino::Utf8PathBuf;
use std::env;

#[cfg(unix)]
use libc::geteuid;

#[cfg(unix)]
use dirs::runtime_dir;

use crate::socket::SocketEndpoint;

/// Default TCP port used when Unix domain sockets are not available.
pub const DEFAULT_TCP_PORT: u16 = 9780;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Seconds a lock acquisition may wait before giving up.
pub const DEFAULT_LOCK_MAX_WAIT_SECS: u64 = 30;

/// Seconds between lock acquisition attempts.
pub const DEFAULT_LOCK_POLL_INTERVAL_SECS: u64 = 10;

/// Directory holding the `ifcfg-*` network interface scripts.
pub const DEFAULT_NETWORK_SCRIPTS_DIR: &str = "/etc/sysconfig/network-scripts";

/// Command used to bring a new interface alias up.
pub const DEFAULT_IFUP_COMMAND: &str = "sudo /sbin/ifup";

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default network scripts directory as an owned path.
pub fn default_network_scripts_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_NETWORK_SCRIPTS_DIR)
}

/// Default interface bring-up command as an owned string.
pub fn default_ifup_command() -> String {
    DEFAULT_IFUP_COMMAND.to_string()
}

/// Computes the default socket endpoint for the daemon.
pub fn default_socket_endpoint() -> SocketEndpoint {
    default_socket_endpoint_inner()
}

#[cfg(unix)]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    let (mut base, apply_namespace) = match runtime_base_directory() {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push("remotecmd");
    if apply_namespace {
        base.push(user_namespace());
    }

    let socket_path = base.join("remotecmdd.sock");
    SocketEndpoint::unix(socket_path)
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

#[cfg(unix)]
fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_TCP_PORT)
}
