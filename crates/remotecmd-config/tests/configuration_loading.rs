use std::ffi::{OsStr, OsString};
use std::fs;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;
use remotecmd_config::Config;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct EnvOverride {
    key: &'static str,
    previous: Option<OsString>,
    guard: Option<MutexGuard<'static, ()>>,
}

impl EnvOverride {
    fn set_var(key: &'static str, value: &OsStr) -> Self {
        let guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        let previous = std::env::var_os(key);
        // Environment mutation is `unsafe` in edition 2024; the mutex keeps
        // overrides serialised across tests in this binary.
        unsafe { std::env::set_var(key, value) };
        Self {
            key,
            previous,
            guard: Some(guard),
        }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        // Restore any previous value (or remove the override) so other tests
        // inherit a clean environment.
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
        drop(self.guard.take());
    }
}

#[test]
fn malformed_configs_return_aggregated_error() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let cli_path = temp_dir.path().join("cli_remotecmd.toml");
    let env_path = temp_dir.path().join("env_remotecmd.toml");

    fs::write(
        &cli_path,
        r#"lock_max_wait_secs = { seconds = 30 "#,
    )
    .expect("write malformed cli config");
    fs::write(
        &env_path,
        r#"vhost_config_file = not_quoted"#,
    )
    .expect("write malformed env config");

    let _env = EnvOverride::set_var("REMOTECMD_CONFIG_PATH", env_path.as_os_str());

    let args = vec![
        OsString::from("remotecmd"),
        OsString::from("--config-path"),
        cli_path.clone().into_os_string(),
    ];

    let error = Config::load_from_iter(args).expect_err("loading must fail");
    let message = error.to_string();
    assert!(
        message.contains("multiple configuration errors"),
        "expected aggregate message, got {message:?}"
    );

    match error.as_ref() {
        OrthoError::Aggregate(aggregate) => {
            let mut mentioned_paths = aggregate
                .iter()
                .filter_map(|err| match err {
                    OrthoError::File { path, .. } => Some(path.clone()),
                    _ => None,
                })
                .collect::<Vec<_>>();
            mentioned_paths.sort();

            assert_eq!(
                mentioned_paths.len(),
                2,
                "expected both failing files to be reported, got {mentioned_paths:?}"
            );
            assert!(
                mentioned_paths.contains(&cli_path),
                "missing CLI path in aggregate: {mentioned_paths:?}"
            );
            assert!(
                mentioned_paths.contains(&env_path),
                "missing env path in aggregate: {mentioned_paths:?}"
            );
        }
        other => panic!("expected aggregated error, got {other:?}"),
    }
}

#[test]
fn non_numeric_lock_timing_is_rejected() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("remotecmd.toml");
    fs::write(&path, "lock_poll_interval_secs = \"soon\"\n").expect("write config");

    let _env = EnvOverride::set_var("REMOTECMD_CONFIG_PATH", path.as_os_str());
    let error = Config::load_from_iter([OsString::from("remotecmd")])
        .expect_err("a string lock interval must be rejected");
    let message = error.to_string();
    assert!(
        message.contains("invalid type") && message.contains("expected u64"),
        "expected a type mismatch in {message}"
    );
}

#[test]
fn command_settings_load_from_file() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("remotecmd.toml");
    fs::write(
        &path,
        concat!(
            "vhost_config_file = \"/etc/httpd/conf.d/vhosts.conf\"\n",
            "vhost_lock_file = \"/var/lock/vhosts.lock\"\n",
            "server_check_command = \"pgrep -f wave\"\n",
            "lock_max_wait_secs = 5\n",
        ),
    )
    .expect("write config");

    let _env = EnvOverride::set_var("REMOTECMD_CONFIG_PATH", path.as_os_str());
    let config = Config::load_from_iter([OsString::from("remotecmd")]).expect("load config");

    let vhost = config.virtual_host_settings();
    assert_eq!(
        vhost.config_file().expect("config file").as_str(),
        "/etc/httpd/conf.d/vhosts.conf"
    );
    assert!(vhost.restart_command().is_err());
    assert_eq!(
        config.server_control_settings().check_command().expect("check"),
        "pgrep -f wave"
    );
    assert_eq!(config.lock_timings().max_wait.as_secs(), 5);
    assert_eq!(config.lock_timings().poll_interval.as_secs(), 10);
}
