//! Content proxy operations: list, read, write, mkdir, delete.
//!
//! Each operation takes the current [`StoreSettings`] snapshot explicitly
//! and fails with [`ProxyError::ConfigurationMissing`] before touching the
//! remote store when owner, repo or token is unset.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use repodrive_api_client::{ClientError, Committer, ContentStore, RepoTarget};
use repodrive_core::scan::SensitiveContentScanner;
use repodrive_core::validate::{self, UploadValidator, ValidationError};
use repodrive_core::{
    ContentEntry, DeleteReport, DeleteRequest, EntryKind, PLACEHOLDER_FILE, UploadRequest, paths,
};
use repodrive_runtime_config::StoreSettings;

/// Commit message for uploads.
pub const UPLOAD_MESSAGE: &str = "Update content";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("store is not configured: owner, repo and token must all be set")]
    ConfigurationMissing,
    #[error("remote store returned {status}: {message}")]
    Remote { status: u16, message: String },
    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("file content may contain sensitive values ({reason}); upload refused")]
    SensitiveContentRejected { reason: String },
    #[error("{0}")]
    InvalidInput(String),
    #[error("remote store unreachable: {0}")]
    Transport(String),
    #[error("failed to persist configuration: {0}")]
    Persistence(String),
}

impl From<ClientError> for ProxyError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Remote { status, message } => Self::Remote { status, message },
            ClientError::PayloadTooLarge { size, limit } => Self::PayloadTooLarge { size, limit },
            ClientError::Transport(e) => Self::Transport(e.to_string()),
            ClientError::Decode(message) => Self::Remote {
                status: 502,
                message,
            },
        }
    }
}

impl From<ValidationError> for ProxyError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::PayloadTooLarge { size, limit } => Self::PayloadTooLarge { size, limit },
            ValidationError::SensitiveContent { reason } => {
                Self::SensitiveContentRejected { reason }
            }
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

/// A directory listing, with the synthetic `..` entry first when not at the root.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub path: String,
    pub parent: Option<String>,
    pub entries: Vec<ContentEntry>,
}

/// File bytes ready to be sent back to the caller.
#[derive(Debug, Clone)]
pub struct FileDownload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Headers preserved from the remote response
    pub headers: Vec<(String, String)>,
    /// Serve as an attachment rather than inline
    pub attachment: bool,
}

pub struct ContentProxy {
    store: Arc<dyn ContentStore>,
    validators: Vec<Box<dyn UploadValidator>>,
}

impl ContentProxy {
    /// Proxy with the default upload validators.
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self::with_validators(store, vec![Box::new(SensitiveContentScanner)])
    }

    pub fn with_validators(
        store: Arc<dyn ContentStore>,
        validators: Vec<Box<dyn UploadValidator>>,
    ) -> Self {
        Self { store, validators }
    }

    /// Resolve the remote target, or fail when the configuration is incomplete.
    pub fn require_target(&self, settings: &StoreSettings) -> Result<RepoTarget, ProxyError> {
        if !settings.is_complete() {
            return Err(ProxyError::ConfigurationMissing);
        }
        let committer = (!settings.committer_name.is_empty()
            && !settings.committer_email.is_empty())
        .then(|| Committer {
            name: settings.committer_name.clone(),
            email: settings.committer_email.clone(),
        });
        Ok(RepoTarget {
            owner: settings.owner.clone(),
            repo: settings.repo.clone(),
            token: settings.token.clone(),
            branch: settings.branch.clone(),
            committer,
        })
    }

    pub async fn list(&self, settings: &StoreSettings, path: &str) -> Result<Listing, ProxyError> {
        let target = self.require_target(settings)?;
        let path = path.trim_matches('/');
        let mut remote = self.store.list(&target, path).await?;
        // Directories first; the sort is stable so remote order holds within each group.
        remote.sort_by_key(|entry| !entry.is_dir());

        let parent = (!path.is_empty()).then(|| paths::parent_of(path));
        let mut entries = Vec::with_capacity(remote.len() + 1);
        if let Some(parent) = &parent {
            entries.push(ContentEntry::parent_link(parent.clone()));
        }
        entries.extend(remote);

        Ok(Listing {
            path: path.to_string(),
            parent,
            entries,
        })
    }

    pub async fn read(
        &self,
        settings: &StoreSettings,
        path: &str,
        download: bool,
    ) -> Result<FileDownload, ProxyError> {
        let target = self.require_target(settings)?;
        let raw = self.store.read_raw(&target, path).await?;
        Ok(FileDownload {
            file_name: paths::file_name(path).to_string(),
            bytes: raw.bytes,
            headers: raw.headers,
            attachment: download,
        })
    }

    /// Upload one file. Returns the directory to show next.
    pub async fn write(
        &self,
        settings: &StoreSettings,
        upload: UploadRequest,
    ) -> Result<String, ProxyError> {
        let target = self.require_target(settings)?;
        if upload.file_name.trim().is_empty() {
            return Err(ProxyError::InvalidInput("no file selected".to_string()));
        }
        validate::check_payload_size(upload.bytes.len())?;
        if let Err(err) = validate::run_validators(&self.validators, &upload) {
            warn!("upload of {} rejected: {err}", upload.target_path());
            return Err(err.into());
        }

        let path = upload.target_path();
        self.store
            .write(&target, &path, &upload.bytes, UPLOAD_MESSAGE)
            .await?;
        info!("wrote {path} ({} bytes)", upload.bytes.len());
        Ok(upload.target_directory)
    }

    /// Create a folder by writing a placeholder file into it.
    pub async fn mkdir(
        &self,
        settings: &StoreSettings,
        directory: &str,
        folder_name: &str,
    ) -> Result<String, ProxyError> {
        let target = self.require_target(settings)?;
        validate::validate_folder_name(folder_name)?;

        let folder = paths::join(directory, folder_name.trim());
        let placeholder = paths::join(&folder, PLACEHOLDER_FILE);
        self.store
            .write(
                &target,
                &placeholder,
                &[],
                &format!("Create folder: {}", folder_name.trim()),
            )
            .await?;
        info!("created folder {folder}");
        Ok(directory.trim_matches('/').to_string())
    }

    /// Delete a file, or every immediate child of a directory.
    ///
    /// Directory deletes are not transactional and do not recurse: each
    /// child is deleted on its own, failures are collected in the report,
    /// and nested directories keep their descendants.
    pub async fn delete(
        &self,
        settings: &StoreSettings,
        request: &DeleteRequest,
    ) -> Result<DeleteReport, ProxyError> {
        let target = self.require_target(settings)?;
        let path = request.path.trim_matches('/');
        if path.is_empty() {
            return Err(ProxyError::InvalidInput(
                "refusing to delete the repository root".to_string(),
            ));
        }

        let mut report = DeleteReport::default();
        match request.kind {
            EntryKind::File => {
                let entry = self.store.entry(&target, path).await?;
                let sha = entry.sha.ok_or_else(|| ProxyError::Remote {
                    status: 502,
                    message: format!("no sha returned for {path}"),
                })?;
                let message = format!("Delete file: {}", paths::file_name(path));
                self.store.delete(&target, path, &sha, &message).await?;
                info!("deleted file {path}");
                report.record_success(path);
            }
            EntryKind::Directory => {
                let children = self.store.list(&target, path).await?;
                for child in children {
                    let Some(sha) = child.sha.as_deref() else {
                        report.record_failure(&child.path, "no sha returned");
                        continue;
                    };
                    let message = format!("Delete {}: {}", child.kind.label(), child.name);
                    match self.store.delete(&target, &child.path, sha, &message).await {
                        Ok(()) => report.record_success(&child.path),
                        Err(err) => {
                            warn!("failed to delete {}: {err}", child.path);
                            report.record_failure(&child.path, err.to_string());
                        }
                    }
                }
                info!(
                    "deleted directory {path}: {} removed, {} failed",
                    report.succeeded.len(),
                    report.failed.len()
                );
            }
        }
        Ok(report)
    }
}
