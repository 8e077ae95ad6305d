//! Plain filesystem commands: copy, rename, remove, list, read, write, mkdir.
//!
//! These run without locks; callers coordinate among themselves.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use remotecmd_protocol::{
    ArgumentNode, CommandResult, DirectoryListing, FileEntry, FileListing, ProcessorArguments,
    ResultDetails,
};

use crate::dispatch::{Command, CommandError};

use super::required_values;

const BLANK_FILE: &str = "File path cannot be null or an empty string";
const BLANK_DIRECTORY: &str = "Directory cannot be null or an empty string";

/// Source and destination pair taken from a `copy` or `rename` node.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Transfer {
    from: PathBuf,
    to: PathBuf,
}

impl Transfer {
    fn from_node(node: &ArgumentNode) -> Result<Self, CommandError> {
        let endpoint = |child: &str| {
            node.child_value(child).map(PathBuf::from).ok_or_else(|| {
                CommandError::validation(format!("{} element <{child}> is required", node.name()))
            })
        };
        Ok(Self {
            from: endpoint("from")?,
            to: endpoint("to")?,
        })
    }

    fn all(arguments: &ProcessorArguments, name: &str) -> Result<Vec<Self>, CommandError> {
        arguments.named(name).map(Self::from_node).collect()
    }
}

fn missing(path: &Path) -> CommandError {
    CommandError::resource(format!("{} does not exist", path.display()))
}

/// Copies files or directory trees into destination directories.
#[derive(Debug, Default)]
pub struct FileCopier {
    transfers: Vec<Transfer>,
}

impl Command for FileCopier {
    fn init(&mut self, arguments: &ProcessorArguments) -> Result<(), CommandError> {
        self.transfers = Transfer::all(arguments, "copy")?;
        Ok(())
    }

    fn execute(&mut self) -> CommandResult {
        self.transfers
            .iter()
            .try_for_each(copy_into)
            .map_or_else(CommandError::into_result, |()| CommandResult::success())
    }
}

fn copy_into(transfer: &Transfer) -> Result<(), CommandError> {
    if !transfer.from.exists() {
        return Err(missing(&transfer.from));
    }
    if !transfer.to.is_dir() {
        return Err(CommandError::resource(format!(
            "copy destination {} is not a directory",
            transfer.to.display()
        )));
    }
    let name = transfer.from.file_name().ok_or_else(|| {
        CommandError::resource(format!("cannot copy {}", transfer.from.display()))
    })?;
    copy_recursive(&transfer.from, &transfer.to.join(name))
}

fn copy_recursive(source: &Path, target: &Path) -> Result<(), CommandError> {
    let failed = |path: &Path, error: &io::Error| {
        CommandError::io(
            format!("failed to copy {} to {}", source.display(), target.display()),
            path,
            error,
        )
    };
    if !source.is_dir() {
        return fs::copy(source, target)
            .map(|_| ())
            .map_err(|error| failed(source, &error));
    }
    fs::create_dir_all(target).map_err(|error| failed(target, &error))?;
    for entry in fs::read_dir(source).map_err(|error| failed(source, &error))? {
        let entry = entry.map_err(|error| failed(source, &error))?;
        copy_recursive(&entry.path(), &target.join(entry.file_name()))?;
    }
    Ok(())
}

/// Renames files or directories.
#[derive(Debug, Default)]
pub struct FileRenamer {
    transfers: Vec<Transfer>,
}

impl Command for FileRenamer {
    fn init(&mut self, arguments: &ProcessorArguments) -> Result<(), CommandError> {
        self.transfers = Transfer::all(arguments, "rename")?;
        Ok(())
    }

    fn execute(&mut self) -> CommandResult {
        self.transfers
            .iter()
            .try_for_each(rename)
            .map_or_else(CommandError::into_result, |()| CommandResult::success())
    }
}

fn rename(transfer: &Transfer) -> Result<(), CommandError> {
    if !transfer.from.exists() {
        return Err(missing(&transfer.from));
    }
    if transfer.to.exists() && transfer.to.is_dir() != transfer.from.is_dir() {
        return Err(CommandError::resource(format!(
            "cannot rename {} to {}: one is a directory and the other is not",
            transfer.from.display(),
            transfer.to.display()
        )));
    }
    fs::rename(&transfer.from, &transfer.to).map_err(|error| {
        CommandError::io("An error occurred renaming the file", &transfer.from, &error)
    })
}

/// Deletes files and directory trees. Absent paths are ignored.
#[derive(Debug, Default)]
pub struct FileRemover {
    files: Vec<PathBuf>,
}

impl Command for FileRemover {
    fn init(&mut self, arguments: &ProcessorArguments) -> Result<(), CommandError> {
        self.files = paths(arguments, "file", BLANK_FILE)?;
        Ok(())
    }

    fn execute(&mut self) -> CommandResult {
        self.files
            .iter()
            .try_for_each(|path| remove(path))
            .map_or_else(CommandError::into_result, |()| CommandResult::success())
    }
}

fn remove(path: &Path) -> Result<(), CommandError> {
    let outcome = match fs::symlink_metadata(path) {
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(error) => Err(error),
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
    };
    outcome.map_err(|error| {
        CommandError::io(format!("failed to remove {}", path.display()), path, &error)
    })
}

/// Lists directory contents, optionally filtered by a wildcard pattern.
#[derive(Debug, Default)]
pub struct FileLister {
    requests: Vec<(PathBuf, Option<String>)>,
}

impl Command for FileLister {
    fn init(&mut self, arguments: &ProcessorArguments) -> Result<(), CommandError> {
        let mut seen = HashSet::new();
        self.requests.clear();
        for node in arguments.named("directory") {
            let directory = node
                .trimmed_value()
                .ok_or_else(|| CommandError::validation(BLANK_DIRECTORY))?;
            if seen.insert(directory.to_owned()) {
                let filter = node.attribute("filter").map(str::to_owned);
                self.requests.push((PathBuf::from(directory), filter));
            }
        }
        Ok(())
    }

    fn execute(&mut self) -> CommandResult {
        self.requests
            .iter()
            .map(|(directory, filter)| list_directory(directory, filter.as_deref()))
            .collect::<Result<Vec<_>, _>>()
            .map_or_else(CommandError::into_result, |directories| {
                CommandResult::success()
                    .with_details(ResultDetails::Listing(FileListing { directories }))
            })
    }
}

fn list_directory(directory: &Path, filter: Option<&str>) -> Result<DirectoryListing, CommandError> {
    if !directory.is_dir() {
        return Err(CommandError::resource(format!(
            "directory {} does not exist",
            directory.display()
        )));
    }
    let failed = |error: io::Error| {
        CommandError::io(
            format!("failed to list {}", directory.display()),
            directory,
            &error,
        )
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(directory).map_err(failed)? {
        let entry = entry.map_err(failed)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if filter.is_some_and(|pattern| !wildcard_matches(pattern, &name)) {
            continue;
        }
        let metadata = entry.metadata().map_err(failed)?;
        let last_modified = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        files.push(FileEntry {
            name,
            last_modified,
            size: metadata.len(),
        });
    }
    files.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(DirectoryListing {
        path: directory.display().to_string(),
        files,
    })
}

/// Matches `name` against a pattern where `*` is any run and `?` one char.
pub(crate) fn wildcard_matches(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let (mut p, mut n) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some(&ch) if ch == '?' || name.get(n) == Some(&ch) => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    n = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }
    pattern.get(p..).is_some_and(|rest| rest.iter().all(|ch| *ch == '*'))
}

/// Returns the content of a text file.
#[derive(Debug, Default)]
pub struct FileReader {
    file: PathBuf,
}

impl Command for FileReader {
    fn init(&mut self, arguments: &ProcessorArguments) -> Result<(), CommandError> {
        self.file = arguments
            .value_of("file")
            .map(PathBuf::from)
            .ok_or_else(|| CommandError::validation(BLANK_FILE))?;
        Ok(())
    }

    fn execute(&mut self) -> CommandResult {
        if !self.file.is_file() {
            return missing(&self.file).into_result();
        }
        match fs::read(&self.file) {
            Ok(bytes) => CommandResult::success().with_details(ResultDetails::Content(
                String::from_utf8_lossy(&bytes).into_owned(),
            )),
            Err(error) => CommandError::io(
                format!("failed to read {}", self.file.display()),
                &self.file,
                &error,
            )
            .into_result(),
        }
    }
}

/// Writes the same content to one or more files, replacing them.
#[derive(Debug, Default)]
pub struct FileWriter {
    content: String,
    files: Vec<PathBuf>,
}

impl Command for FileWriter {
    fn init(&mut self, arguments: &ProcessorArguments) -> Result<(), CommandError> {
        let content = arguments
            .first("content")
            .ok_or_else(|| CommandError::validation("content element is required"))?;
        let files = paths(arguments, "file", BLANK_FILE)?;
        if files.is_empty() {
            return Err(CommandError::validation(BLANK_FILE));
        }
        self.content = content.value().unwrap_or_default().to_owned();
        self.files = files;
        Ok(())
    }

    fn execute(&mut self) -> CommandResult {
        self.files
            .iter()
            .try_for_each(|path| {
                fs::write(path, &self.content).map_err(|error| {
                    CommandError::io(format!("failed to write {}", path.display()), path, &error)
                })
            })
            .map_or_else(CommandError::into_result, |()| CommandResult::success())
    }
}

/// Creates directories along with any missing parents.
#[derive(Debug, Default)]
pub struct DirectoryCreator {
    directories: Vec<PathBuf>,
}

impl Command for DirectoryCreator {
    fn init(&mut self, arguments: &ProcessorArguments) -> Result<(), CommandError> {
        self.directories = paths(arguments, "directory", BLANK_DIRECTORY)?;
        Ok(())
    }

    fn execute(&mut self) -> CommandResult {
        self.directories
            .iter()
            .try_for_each(|path| {
                fs::create_dir_all(path).map_err(|error| {
                    CommandError::io(format!("failed to create {}", path.display()), path, &error)
                })
            })
            .map_or_else(CommandError::into_result, |()| CommandResult::success())
    }
}

fn paths(
    arguments: &ProcessorArguments,
    name: &str,
    blank_message: &str,
) -> Result<Vec<PathBuf>, CommandError> {
    required_values(arguments, name, blank_message)
        .map(|values| values.into_iter().map(PathBuf::from).collect())
}
