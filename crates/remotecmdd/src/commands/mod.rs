//! Built-in commands and the shared context they are constructed from.

mod files;
mod ip_installer;
mod server_control;
mod vhost;

use std::fmt;
use std::sync::Arc;

use remotecmd_config::{Config, IpInstallerSettings, ServerControlSettings, VirtualHostSettings};
use remotecmd_protocol::ProcessorArguments;

use crate::dispatch::{Command, CommandError, CommandFactory};
use crate::exec::{CommandRunner, ProcessOutput, SystemRunner};
use crate::lock::LockOptions;

pub use files::{
    DirectoryCreator, FileCopier, FileLister, FileReader, FileRemover, FileRenamer, FileWriter,
};
pub use ip_installer::IpAddressInstaller;
pub use server_control::{ServerAction, ServerControl, StopPolicy};
pub use vhost::{VirtualHostEditor, VirtualHostSpec, change_custom_url};

/// Type identifier of [`VirtualHostEditor`].
pub const VIRTUAL_HOST_EDITOR: &str = "remotecmd.ApacheVirtualHostEditor";
/// Type identifier of [`ServerControl`].
pub const SERVER_CONTROL: &str = "remotecmd.ServerControl";
/// Type identifier of [`FileCopier`].
pub const FILE_COPIER: &str = "remotecmd.FileCopier";
/// Type identifier of [`FileRenamer`].
pub const FILE_RENAMER: &str = "remotecmd.FileRenamer";
/// Type identifier of [`FileRemover`].
pub const FILE_REMOVER: &str = "remotecmd.FileRemover";
/// Type identifier of [`FileLister`].
pub const FILE_LISTER: &str = "remotecmd.FileLister";
/// Type identifier of [`FileReader`].
pub const FILE_READER: &str = "remotecmd.FileReader";
/// Type identifier of [`FileWriter`].
pub const FILE_WRITER: &str = "remotecmd.FileWriter";
/// Type identifier of [`DirectoryCreator`].
pub const DIRECTORY_CREATOR: &str = "remotecmd.DirectoryCreator";
/// Type identifier of [`IpAddressInstaller`].
pub const IP_ADDRESS_INSTALLER: &str = "remotecmd.IpAddressInstaller";

/// Settings and collaborators shared by every command instance.
#[derive(Clone)]
pub struct CommandContext {
    /// Virtual host editor settings.
    pub virtual_hosts: VirtualHostSettings,
    /// Server lifecycle settings.
    pub server: ServerControlSettings,
    /// Interface alias settings.
    pub ip_installer: IpInstallerSettings,
    /// Lock wait budget for every locked command.
    pub lock: LockOptions,
    /// Grace period applied when stopping the managed server.
    pub stop_policy: StopPolicy,
    /// Runs configured command lines.
    pub runner: Arc<dyn CommandRunner>,
}

impl CommandContext {
    /// Context derived from configuration, running real subprocesses.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            virtual_hosts: config.virtual_host_settings(),
            server: config.server_control_settings(),
            ip_installer: config.ip_installer_settings(),
            lock: LockOptions::from(config.lock_timings()),
            stop_policy: StopPolicy::default(),
            runner: Arc::new(SystemRunner),
        }
    }

    /// Replaces the subprocess runner.
    #[must_use]
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("virtual_hosts", &self.virtual_hosts)
            .field("server", &self.server)
            .field("ip_installer", &self.ip_installer)
            .field("lock", &self.lock)
            .field("stop_policy", &self.stop_policy)
            .finish_non_exhaustive()
    }
}

/// Factories for every built-in command, keyed by type identifier.
pub(crate) fn builtin_factories(
    context: &Arc<CommandContext>,
) -> Vec<(&'static str, CommandFactory)> {
    vec![
        (VIRTUAL_HOST_EDITOR, factory(context, VirtualHostEditor::new)),
        (SERVER_CONTROL, factory(context, ServerControl::new)),
        (FILE_COPIER, factory(context, |_| FileCopier::default())),
        (FILE_RENAMER, factory(context, |_| FileRenamer::default())),
        (FILE_REMOVER, factory(context, |_| FileRemover::default())),
        (FILE_LISTER, factory(context, |_| FileLister::default())),
        (FILE_READER, factory(context, |_| FileReader::default())),
        (FILE_WRITER, factory(context, |_| FileWriter::default())),
        (DIRECTORY_CREATOR, factory(context, |_| DirectoryCreator::default())),
        (IP_ADDRESS_INSTALLER, factory(context, IpAddressInstaller::new)),
    ]
}

fn factory<C, F>(context: &Arc<CommandContext>, build: F) -> CommandFactory
where
    C: Command + 'static,
    F: Fn(&CommandContext) -> C + Send + Sync + 'static,
{
    let shared = Arc::clone(context);
    Box::new(move || -> Box<dyn Command> { Box::new(build(&shared)) })
}

/// Runs `command_line` and fails unless it exits with status zero.
pub(crate) fn run_checked(
    runner: &dyn CommandRunner,
    command_line: &str,
) -> Result<ProcessOutput, CommandError> {
    let output = runner
        .run(command_line)
        .map_err(|error| CommandError::spawn(command_line, &error))?;
    if output.success() {
        Ok(output)
    } else {
        Err(CommandError::exited(command_line, &output))
    }
}

/// Trimmed values of every top-level node called `name`, rejecting blanks.
fn required_values(
    arguments: &ProcessorArguments,
    name: &str,
    blank_message: &str,
) -> Result<Vec<String>, CommandError> {
    arguments
        .named(name)
        .map(|node| {
            node.trimmed_value()
                .map(str::to_owned)
                .ok_or_else(|| CommandError::validation(blank_message))
        })
        .collect()
}
