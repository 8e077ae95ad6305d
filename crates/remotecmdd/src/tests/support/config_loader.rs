//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::OrthoError;
use remotecmd_config::{Config, SocketEndpoint};
use tempfile::TempDir;

use crate::bootstrap::ConfigLoader;

/// Loader that places the daemon socket under a temporary directory.
pub struct TestConfigLoader {
    socket_dir: TempDir,
    base: Config,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Uses `base` for every setting except the socket.
    #[must_use]
    pub fn with_config(base: Config) -> Self {
        let socket_dir = TempDir::new().expect("failed to create temporary directory for socket");
        Self { socket_dir, base }
    }

    pub fn socket_path(&self) -> String {
        self.socket_dir
            .path()
            .join("remotecmdd.sock")
            .to_str()
            .expect("temporary socket path was not valid UTF-8")
            .to_owned()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            daemon_socket: SocketEndpoint::unix(self.socket_path()),
            ..self.base.clone()
        })
    }
}

/// Loader that fails by passing an unparseable socket flag.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_args([
            OsString::from("remotecmdd"),
            OsString::from("--daemon-socket"),
            OsString::from("invalid://socket"),
        ])
    }
}
