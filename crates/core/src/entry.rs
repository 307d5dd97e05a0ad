use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Largest payload accepted by a single write (25 MiB).
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Zero-byte file standing in for an otherwise empty directory.
pub const PLACEHOLDER_FILE: &str = ".gitkeep";

/// Kind of an entry in the content store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    /// Parse the form value used by delete requests (`file` / `dir`).
    pub fn from_form(value: &str) -> Option<Self> {
        match value.trim() {
            "file" => Some(Self::File),
            "dir" | "directory" => Some(Self::Directory),
            _ => None,
        }
    }

    /// Short label used in commit messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "dir",
        }
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// Full path relative to the repository root
    pub path: String,
    /// Final path segment, or `..` for the synthetic parent entry
    pub name: String,
    pub kind: EntryKind,
    /// Content hash; absent for synthetic entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

impl ContentEntry {
    /// Synthetic `..` entry pointing at `parent`.
    pub fn parent_link(parent: impl Into<String>) -> Self {
        Self {
            path: parent.into(),
            name: "..".to_string(),
            kind: EntryKind::Directory,
            sha: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// A file to be written into a target directory.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub target_directory: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Declared MIME type, empty when the client sent none
    pub mime_hint: String,
}

impl UploadRequest {
    /// `directory/fileName`, or just `fileName` at the root.
    pub fn target_path(&self) -> String {
        crate::paths::join(&self.target_directory, &self.file_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub path: String,
    pub kind: EntryKind,
}

/// Outcome of a delete: which paths were removed and which failed.
///
/// Directory deletes remove each immediate child independently, so a
/// partial failure leaves `failed` populated while `succeeded` still lists
/// the entries that are gone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    pub succeeded: BTreeSet<String>,
    pub failed: BTreeMap<String, String>,
}

impl DeleteReport {
    pub fn record_success(&mut self, path: impl Into<String>) {
        self.succeeded.insert(path.into());
    }

    pub fn record_failure(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.failed.insert(path.into(), reason.into());
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
