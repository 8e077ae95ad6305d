//! Scripted [`CommandRunner`] that records every command line it is given.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::exec::{CommandRunner, ProcessOutput, RunError};

/// Answers command lines from a script; unscripted lines succeed silently.
///
/// Each command line owns a queue of outputs. The last queued output
/// repeats once the queue is down to one entry, so a liveness check can be
/// scripted as "running, running, stopped" or as "always running".
#[derive(Debug, Default)]
pub struct RecordingRunner {
    script: Mutex<HashMap<String, VecDeque<ProcessOutput>>>,
    calls: Mutex<Vec<String>>,
}

impl RecordingRunner {
    /// Queues `output` for `command_line`.
    pub fn respond(&self, command_line: &str, output: ProcessOutput) {
        self.script
            .lock()
            .expect("runner script mutex poisoned")
            .entry(command_line.to_owned())
            .or_default()
            .push_back(output);
    }

    /// Every command line run so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("runner calls mutex poisoned").clone()
    }

    /// How often `command_line` was run.
    #[must_use]
    pub fn count(&self, command_line: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.as_str() == command_line)
            .count()
    }

    /// Output with exit status zero and the given stdout.
    #[must_use]
    pub fn printing(stdout: &str) -> ProcessOutput {
        ProcessOutput {
            status: Some(0),
            stdout: stdout.to_owned(),
            stderr: String::new(),
        }
    }

    /// Output with a non-zero exit status and the given stderr.
    #[must_use]
    pub fn failing(status: i32, stderr: &str) -> ProcessOutput {
        ProcessOutput {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.to_owned(),
        }
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command_line: &str) -> Result<ProcessOutput, RunError> {
        self.calls
            .lock()
            .expect("runner calls mutex poisoned")
            .push(command_line.to_owned());
        let mut script = self.script.lock().expect("runner script mutex poisoned");
        let output = match script.get_mut(command_line) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(output.unwrap_or_else(|| Self::printing("")))
    }
}
