//! Structured health reporting for daemon lifecycle and dispatch events.

use std::sync::Arc;

use remotecmd_config::Config;
use remotecmd_protocol::CommandResult;

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked before a command type is resolved.
    fn command_dispatched(&self, type_id: &str);

    /// Invoked once the command has produced its result.
    fn command_completed(&self, type_id: &str, result: &CommandResult);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn command_dispatched(&self, type_id: &str) {
        (**self).command_dispatched(type_id);
    }

    fn command_completed(&self, type_id: &str, result: &CommandResult) {
        (**self).command_completed(type_id, result);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            socket = %config.daemon_socket(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            lock_max_wait_secs = config.lock_max_wait_secs,
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn command_dispatched(&self, type_id: &str) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "command_dispatched",
            type_id,
            "command dispatched"
        );
    }

    fn command_completed(&self, type_id: &str, result: &CommandResult) {
        if result.is_success() {
            tracing::info!(
                target: HEALTH_TARGET,
                event = "command_completed",
                type_id,
                status = ?result.status(),
                "command succeeded"
            );
        } else {
            tracing::warn!(
                target: HEALTH_TARGET,
                event = "command_completed",
                type_id,
                status = ?result.status(),
                reason = result.reason().unwrap_or_default(),
                "command failed"
            );
        }
    }
}
