//! In-memory [`ContentStore`] for tests.
//!
//! Behaves like the GitHub contents API for the operations the proxy uses:
//! directories exist only through the files under them, listing a file
//! yields that single file, deletes need the current sha and fail on
//! directories. Every call is recorded so tests can assert how many remote
//! calls an operation made.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use repodrive_core::{ContentEntry, EntryKind, paths};
use sha2::{Digest, Sha256};

use crate::store::{ClientError, ContentStore, RawContent, RepoTarget, Result, check_write_size};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    List(String),
    Entry(String),
    ReadRaw(String),
    Write { path: String, message: String },
    Delete { path: String, message: String },
}

impl RemoteCall {
    pub fn path(&self) -> &str {
        match self {
            Self::List(p) | Self::Entry(p) | Self::ReadRaw(p) => p,
            Self::Write { path, .. } | Self::Delete { path, .. } => path,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete { .. })
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}

#[derive(Default)]
struct Inner {
    files: BTreeMap<String, Vec<u8>>,
    calls: Vec<RemoteCall>,
    failing_deletes: BTreeSet<String>,
    targets: Vec<(String, String)>,
}

#[derive(Default)]
pub struct MemoryContentStore {
    inner: Mutex<Inner>,
}

pub fn sha_of(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed files without recording calls.
    pub fn with_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            for (path, bytes) in files {
                inner.files.insert(path.to_string(), bytes.to_vec());
            }
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }

    /// Make every delete of `path` fail with a 500.
    pub fn fail_delete(&self, path: &str) {
        self.lock().failing_deletes.insert(path.to_string());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// `(owner, repo)` of every call, in order.
    pub fn targets(&self) -> Vec<(String, String)> {
        self.lock().targets.clone()
    }

    fn record(&self, target: &RepoTarget, call: RemoteCall) -> MutexGuard<'_, Inner> {
        let mut inner = self.lock();
        inner.calls.push(call);
        inner
            .targets
            .push((target.owner.clone(), target.repo.clone()));
        inner
    }
}

fn file_entry(path: &str, bytes: &[u8]) -> ContentEntry {
    ContentEntry {
        path: path.to_string(),
        name: paths::file_name(path).to_string(),
        kind: EntryKind::File,
        sha: Some(sha_of(bytes)),
    }
}

fn dir_entry(path: &str) -> ContentEntry {
    ContentEntry {
        path: path.to_string(),
        name: paths::file_name(path).to_string(),
        kind: EntryKind::Directory,
        sha: Some(sha_of(format!("tree:{path}").as_bytes())),
    }
}

fn is_dir(files: &BTreeMap<String, Vec<u8>>, path: &str) -> bool {
    let prefix = format!("{path}/");
    files.keys().any(|k| k.starts_with(&prefix))
}

fn not_found(path: &str) -> ClientError {
    ClientError::remote(404, format!("Not Found: {path} - Status: 404"))
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn list(&self, target: &RepoTarget, path: &str) -> Result<Vec<ContentEntry>> {
        let inner = self.record(target, RemoteCall::List(path.to_string()));
        if let Some(bytes) = inner.files.get(path) {
            return Ok(vec![file_entry(path, bytes)]);
        }

        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        let mut children: BTreeMap<String, ContentEntry> = BTreeMap::new();
        for (file_path, bytes) in &inner.files {
            let Some(rest) = file_path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((child, _)) => {
                    let child_path = format!("{prefix}{child}");
                    children
                        .entry(child_path.clone())
                        .or_insert_with(|| dir_entry(&child_path));
                }
                None => {
                    children.insert(file_path.clone(), file_entry(file_path, bytes));
                }
            }
        }

        if children.is_empty() && !path.is_empty() {
            return Err(not_found(path));
        }
        Ok(children.into_values().collect())
    }

    async fn entry(&self, target: &RepoTarget, path: &str) -> Result<ContentEntry> {
        let inner = self.record(target, RemoteCall::Entry(path.to_string()));
        match inner.files.get(path) {
            Some(bytes) => Ok(file_entry(path, bytes)),
            None if is_dir(&inner.files, path) => Err(ClientError::Decode(format!(
                "{path:?} is a directory, expected a file"
            ))),
            None => Err(not_found(path)),
        }
    }

    async fn read_raw(&self, target: &RepoTarget, path: &str) -> Result<RawContent> {
        let inner = self.record(target, RemoteCall::ReadRaw(path.to_string()));
        let bytes = inner.files.get(path).ok_or_else(|| not_found(path))?;
        Ok(RawContent {
            bytes: bytes.clone(),
            headers: vec![(
                "content-type".to_string(),
                "text/plain; charset=utf-8".to_string(),
            )],
        })
    }

    async fn write(
        &self,
        target: &RepoTarget,
        path: &str,
        bytes: &[u8],
        message: &str,
    ) -> Result<()> {
        check_write_size(bytes.len())?;
        let mut inner = self.record(
            target,
            RemoteCall::Write {
                path: path.to_string(),
                message: message.to_string(),
            },
        );
        inner.files.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(
        &self,
        target: &RepoTarget,
        path: &str,
        sha: &str,
        message: &str,
    ) -> Result<()> {
        let mut inner = self.record(
            target,
            RemoteCall::Delete {
                path: path.to_string(),
                message: message.to_string(),
            },
        );
        if inner.failing_deletes.contains(path) {
            return Err(ClientError::remote(500, "Server Error - Status: 500"));
        }
        let Some(bytes) = inner.files.get(path) else {
            if is_dir(&inner.files, path) {
                return Err(ClientError::remote(
                    422,
                    format!("{path} is a directory - Status: 422"),
                ));
            }
            return Err(not_found(path));
        };
        if sha_of(bytes) != sha {
            return Err(ClientError::remote(
                409,
                format!("{path} does not match {sha} - Status: 409"),
            ));
        }
        inner.files.remove(path);
        Ok(())
    }
}
