//! Launch sequencing for the serving daemon.

use std::sync::Arc;

use tracing::info;

use crate::StructuredHealthReporter;
use crate::bootstrap::{ConfigLoader, StaticConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::dispatch::ProcessorConnectionHandler;
use crate::health::HealthReporter;
use crate::transport::SocketListener;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Collaborators required to launch the daemon runtime.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) shutdown: S,
}

/// Runs the daemon in the foreground until a termination signal arrives.
///
/// # Errors
///
/// Returns [`LaunchError`] when configuration, bootstrap, binding, or the
/// signal wait fails.
pub fn run_daemon(loader: SystemConfigLoader) -> Result<(), LaunchError> {
    run_daemon_with(LaunchPlan {
        loader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal,
    })
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        shutdown,
    } = plan;

    let config = loader.load()?;
    config.daemon_socket().prepare_filesystem()?;
    let listener = SocketListener::bind(config.daemon_socket())?;

    let daemon = bootstrap_with(&StaticConfigLoader::new(config), reporter)?;
    let handler = Arc::new(ProcessorConnectionHandler::new(daemon.dispatcher()));
    info!(
        target: PROCESS_TARGET,
        endpoint = %daemon.config().daemon_socket(),
        "daemon ready"
    );

    let listener_handle = listener.start(handler)?;
    shutdown.wait()?;
    listener_handle.shutdown();
    listener_handle.join()?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
