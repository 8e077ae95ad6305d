//! Shutdown signal triggered from the test thread.

use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::process::shutdown::{ShutdownError, ShutdownSignal};

/// Blocks until the paired sender fires or is dropped.
pub struct ChannelShutdownSignal {
    receiver: Mutex<Receiver<()>>,
}

impl ChannelShutdownSignal {
    #[must_use]
    pub fn new() -> (Sender<()>, Self) {
        let (sender, receiver) = mpsc::channel();
        (
            sender,
            Self {
                receiver: Mutex::new(receiver),
            },
        )
    }
}

impl ShutdownSignal for ChannelShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let receiver = self.receiver.lock().expect("shutdown receiver poisoned");
        let _ = receiver.recv();
        Ok(())
    }
}
