//! Directory listing payload returned by the file lister.

use serde::{Deserialize, Serialize};

/// Listing of one or more directories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileListing {
    /// Listed directories in request order.
    #[serde(rename = "listing")]
    pub directories: Vec<DirectoryListing>,
}

/// Entries found in a single directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryListing {
    /// Directory path as requested.
    pub path: String,
    /// Matching entries.
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// A single directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Entry name without the directory prefix.
    pub name: String,
    /// Modification time in milliseconds since the Unix epoch.
    #[serde(rename = "lastModified")]
    pub last_modified: u64,
    /// Size in bytes.
    pub size: u64,
}

impl FileListing {
    /// Appends a directory.
    pub fn push(&mut self, directory: DirectoryListing) {
        self.directories.push(directory);
    }

    /// `true` when no directories were listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }
}
