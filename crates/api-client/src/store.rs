use async_trait::async_trait;
use repodrive_core::ContentEntry;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("remote store returned {status}: {message}")]
    Remote { status: u16, message: String },
    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected remote response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// HTTP status from the remote store, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Identity recorded on commits created by writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

/// Repository, branch and credentials every remote call is made against.
#[derive(Clone, PartialEq, Eq)]
pub struct RepoTarget {
    pub owner: String,
    pub repo: String,
    pub token: String,
    pub branch: String,
    pub committer: Option<Committer>,
}

impl fmt::Debug for RepoTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoTarget")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("committer", &self.committer)
            .finish_non_exhaustive()
    }
}

/// Raw file bytes plus the response headers worth passing through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawContent {
    pub bytes: Vec<u8>,
    pub headers: Vec<(String, String)>,
}

impl RawContent {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The four operations of a remote versioned content store.
///
/// Every call is single-shot: no retries, no caching.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Immediate children of `path` (a single entry when `path` is a file).
    async fn list(&self, target: &RepoTarget, path: &str) -> Result<Vec<ContentEntry>>;

    /// Metadata of one file, including its current sha.
    async fn entry(&self, target: &RepoTarget, path: &str) -> Result<ContentEntry>;

    async fn read_raw(&self, target: &RepoTarget, path: &str) -> Result<RawContent>;

    /// Create or overwrite one file. Fails locally with
    /// [`ClientError::PayloadTooLarge`] above the upload limit.
    async fn write(&self, target: &RepoTarget, path: &str, bytes: &[u8], message: &str)
    -> Result<()>;

    /// Remove one file. `sha` must be the entry's current hash.
    async fn delete(&self, target: &RepoTarget, path: &str, sha: &str, message: &str)
    -> Result<()>;
}

/// Shared size precondition for every `ContentStore::write`.
pub fn check_write_size(size: usize) -> Result<()> {
    repodrive_core::validate::check_payload_size(size).map_err(|_| ClientError::PayloadTooLarge {
        size,
        limit: repodrive_core::MAX_UPLOAD_BYTES,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_target_debug_hides_token() {
        let target = RepoTarget {
            owner: "octo".into(),
            repo: "gallery".into(),
            token: "ghp_secret".into(),
            branch: "main".into(),
            committer: None,
        };
        assert!(!format!("{target:?}").contains("ghp_secret"));
    }

    #[test]
    fn raw_content_header_lookup_is_case_insensitive() {
        let raw = RawContent {
            bytes: Vec::new(),
            headers: vec![("Content-Type".into(), "image/png".into())],
        };
        assert_eq!(raw.header("content-type"), Some("image/png"));
        assert_eq!(raw.header("etag"), None);
    }

    #[test]
    fn write_size_check_reports_limit() {
        let err = check_write_size(repodrive_core::MAX_UPLOAD_BYTES + 1).unwrap_err();
        assert!(matches!(err, ClientError::PayloadTooLarge { .. }));
        assert!(check_write_size(0).is_ok());
    }
}
