//! Test double for [`HealthReporter`] that records structured events.

use std::sync::Mutex;

use remotecmd_config::Config;
use remotecmd_protocol::CommandResult;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    CommandDispatched(String),
    CommandCompleted { type_id: String, success: bool },
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn command_dispatched(&self, type_id: &str) {
        self.record(HealthEvent::CommandDispatched(type_id.to_owned()));
    }

    fn command_completed(&self, type_id: &str, result: &CommandResult) {
        self.record(HealthEvent::CommandCompleted {
            type_id: type_id.to_owned(),
            success: result.is_success(),
        });
    }
}
