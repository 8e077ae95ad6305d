//! Resolves a type identifier and drives one command through its lifecycle.

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use once_cell::sync::Lazy;
use remotecmd_protocol::{CommandResult, ProcessorArguments};
use tracing::{debug, warn};

use crate::health::HealthReporter;

use super::DISPATCH_TARGET;
use super::registry::CommandRegistry;

thread_local! {
    static PANIC_LOCATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Chains a hook in front of the existing one that remembers where the
/// current thread last panicked.
static LOCATION_HOOK: Lazy<()> = Lazy::new(|| {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if let Some(location) = info.location() {
            PANIC_LOCATION.with(|slot| *slot.borrow_mut() = Some(location.to_string()));
        }
        previous(info);
    }));
});

/// Runs commands looked up in a [`CommandRegistry`].
pub struct Dispatcher {
    registry: CommandRegistry,
    reporter: Arc<dyn HealthReporter>,
}

impl Dispatcher {
    /// Creates a dispatcher over `registry`.
    pub fn new(registry: CommandRegistry, reporter: Arc<dyn HealthReporter>) -> Self {
        Self { registry, reporter }
    }

    /// Registry consulted for every dispatch.
    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Runs the command registered as `type_id`.
    ///
    /// Unknown identifiers fail without building anything. When `init`
    /// rejects the arguments, `execute` is never called. A panic inside the
    /// command becomes a failed result carrying the panic message, traced
    /// with the command type and the source location of the panic.
    pub fn dispatch(&self, type_id: &str, arguments: &ProcessorArguments) -> CommandResult {
        self.reporter.command_dispatched(type_id);
        let result = self.run(type_id, arguments);
        self.reporter.command_completed(type_id, &result);
        result
    }

    fn run(&self, type_id: &str, arguments: &ProcessorArguments) -> CommandResult {
        let Some(mut command) = self.registry.instantiate(type_id) else {
            warn!(target: DISPATCH_TARGET, type_id, "unknown command type");
            return CommandResult::failure(format!("unknown command type: {type_id}"));
        };

        Lazy::force(&LOCATION_HOOK);
        PANIC_LOCATION.with(|slot| slot.borrow_mut().take());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            if let Err(error) = command.init(arguments) {
                debug!(
                    target: DISPATCH_TARGET,
                    type_id,
                    %error,
                    "command rejected its arguments"
                );
                return error.into_result();
            }
            command.execute()
        }));

        outcome.unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            let location = PANIC_LOCATION
                .with(|slot| slot.borrow_mut().take())
                .unwrap_or_else(|| "an unknown location".to_owned());
            warn!(
                target: DISPATCH_TARGET,
                type_id,
                reason = %message,
                location = %location,
                "command panicked"
            );
            CommandResult::failure(message).with_trace(format!("{type_id} panicked at {location}"))
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "command panicked".to_owned())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::dispatch::{Command, CommandError};
    use crate::health::StructuredHealthReporter;
    use remotecmd_protocol::{ArgumentNode, ResultStatus};
    use rstest::{fixture, rstest};

    struct Probe {
        built: Arc<AtomicUsize>,
        executed: Arc<AtomicUsize>,
    }

    struct ProbeCommand {
        executed: Arc<AtomicUsize>,
    }

    impl Command for ProbeCommand {
        fn init(&mut self, arguments: &ProcessorArguments) -> Result<(), CommandError> {
            match arguments.value_of("mode") {
                Some("invalid") => Err(CommandError::validation("mode is invalid")),
                _ => Ok(()),
            }
        }

        fn execute(&mut self) -> CommandResult {
            self.executed.fetch_add(1, Ordering::SeqCst);
            CommandResult::success().with_reason("probed")
        }
    }

    struct PanickingCommand;

    impl Command for PanickingCommand {
        fn init(&mut self, _arguments: &ProcessorArguments) -> Result<(), CommandError> {
            Ok(())
        }

        fn execute(&mut self) -> CommandResult {
            panic!("disk on fire");
        }
    }

    #[fixture]
    fn probe() -> Probe {
        Probe {
            built: Arc::new(AtomicUsize::new(0)),
            executed: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn dispatcher(probe: &Probe) -> Dispatcher {
        let mut registry = CommandRegistry::new();
        let built = Arc::clone(&probe.built);
        let executed = Arc::clone(&probe.executed);
        registry
            .register(
                "test.Probe",
                Box::new(move || -> Box<dyn Command> {
                    built.fetch_add(1, Ordering::SeqCst);
                    Box::new(ProbeCommand {
                        executed: Arc::clone(&executed),
                    })
                }),
            )
            .expect("register probe");
        registry
            .register(
                "test.Panic",
                Box::new(|| -> Box<dyn Command> { Box::new(PanickingCommand) }),
            )
            .expect("register panic");
        Dispatcher::new(registry, Arc::new(StructuredHealthReporter::new()))
    }

    #[rstest]
    fn unknown_type_builds_nothing(probe: Probe) {
        let result = dispatcher(&probe).dispatch("test.Missing", &ProcessorArguments::new());
        assert_eq!(result.status(), ResultStatus::Failure);
        assert_eq!(result.reason(), Some("unknown command type: test.Missing"));
        assert_eq!(probe.built.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    fn validation_failure_skips_execute(probe: Probe) {
        let arguments: ProcessorArguments =
            std::iter::once(ArgumentNode::leaf("mode", "invalid")).collect();
        let result = dispatcher(&probe).dispatch("test.Probe", &arguments);
        assert_eq!(result.reason(), Some("mode is invalid"));
        assert_eq!(probe.built.load(Ordering::SeqCst), 1);
        assert_eq!(probe.executed.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    fn valid_arguments_reach_execute(probe: Probe) {
        let result = dispatcher(&probe).dispatch("test.Probe", &ProcessorArguments::new());
        assert!(result.is_success());
        assert_eq!(result.reason(), Some("probed"));
        assert_eq!(probe.executed.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    fn panics_become_failures(probe: Probe) {
        let result = dispatcher(&probe).dispatch("test.Panic", &ProcessorArguments::new());
        assert_eq!(result.status(), ResultStatus::Failure);
        assert_eq!(result.reason(), Some("disk on fire"));
        let trace = result.trace().expect("panics carry a trace");
        assert!(
            trace.starts_with("test.Panic panicked at ") && trace.contains("dispatcher.rs"),
            "unexpected trace {trace}"
        );
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = CommandRegistry::new();
        registry
            .register("x", Box::new(|| -> Box<dyn Command> { Box::new(PanickingCommand) }))
            .expect("first registration");
        let error = registry
            .register("x", Box::new(|| -> Box<dyn Command> { Box::new(PanickingCommand) }))
            .expect_err("second registration");
        assert_eq!(error.to_string(), "command type 'x' is already registered");
    }

    #[test]
    fn standard_registry_lists_every_builtin() {
        let context = crate::commands::CommandContext::from_config(&remotecmd_config::Config::default());
        let registry = CommandRegistry::standard(context);
        assert_eq!(
            registry.type_ids(),
            vec![
                "remotecmd.ApacheVirtualHostEditor",
                "remotecmd.DirectoryCreator",
                "remotecmd.FileCopier",
                "remotecmd.FileLister",
                "remotecmd.FileReader",
                "remotecmd.FileRemover",
                "remotecmd.FileRenamer",
                "remotecmd.FileWriter",
                "remotecmd.IpAddressInstaller",
                "remotecmd.ServerControl",
            ]
        );
    }
}
