//! Shared doubles and fixtures for the daemon test suites.

mod config_loader;
mod reporter;
mod runner;
mod shutdown;
mod world;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use runner::RecordingRunner;
pub use shutdown::ChannelShutdownSignal;
pub use world::{TestWorld, world};
