//! Proxy configuration types.
//!
//! The server reads `repodrive.toml` at startup, applies environment
//! overrides, and writes the `[store]` section back when the remote target
//! is changed at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "repodrive.toml";

/// Environment variable naming an explicit config file path.
pub const ENV_CONFIG_PATH: &str = "REPODRIVE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write config at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Top-level configuration (persisted as `repodrive.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// When non-empty, configuration routes require this key.
    #[serde(default)]
    pub admin_key: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            admin_key: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Remote content store target and credentials.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreSettings {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_raw_base_url")]
    pub raw_base_url: String,
    #[serde(default)]
    pub committer_name: String,
    #[serde(default)]
    pub committer_email: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            token: String::new(),
            branch: default_branch(),
            api_base_url: default_api_base_url(),
            raw_base_url: default_raw_base_url(),
            committer_name: String::new(),
            committer_email: String::new(),
        }
    }
}

impl StoreSettings {
    /// Owner, repo and token are all set.
    pub fn is_complete(&self) -> bool {
        !self.owner.trim().is_empty()
            && !self.repo.trim().is_empty()
            && !self.token.trim().is_empty()
    }

    /// Replace the remote target, keeping endpoint and committer settings.
    pub fn with_credentials(&self, owner: &str, repo: &str, token: &str) -> Self {
        Self {
            owner: owner.trim().to_string(),
            repo: repo.trim().to_string(),
            token: token.trim().to_string(),
            ..self.clone()
        }
    }
}

impl fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSettings")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &redact(&self.token))
            .field("branch", &self.branch)
            .field("api_base_url", &self.api_base_url)
            .field("raw_base_url", &self.raw_base_url)
            .field("committer_name", &self.committer_name)
            .field("committer_email", &self.committer_email)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "[redacted]" }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_branch() -> String {
    "main".to_string()
}
fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}
fn default_raw_base_url() -> String {
    "https://raw.githubusercontent.com".to_string()
}

// ── Loading and saving ──────────────────────────────────────────────────

/// Config path from `REPODRIVE_CONFIG`, or `repodrive.toml` in the working directory.
pub fn config_path() -> PathBuf {
    std::env::var(ENV_CONFIG_PATH)
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Load a config file. A missing file yields defaults.
pub fn load_from(path: &Path) -> Result<ProxyConfig, ConfigError> {
    if !path.exists() {
        return Ok(ProxyConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a config file, replacing it through a sibling temp file.
pub fn save_to(path: &Path, config: &ProxyConfig) -> Result<(), ConfigError> {
    let encoded = toml::to_string_pretty(config)?;
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, encoded).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)
}

/// Apply environment overrides. Returns true when any field changed.
///
/// `lookup` is `std::env::var` in the binary; tests pass a map.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut changed = false;

    let mut set = |field: &mut String, value: Option<String>| {
        if let Some(value) = value {
            *field = value.trim().to_string();
            changed = true;
        }
    };

    set(&mut config.store.owner, get("GITHUB_OWNER"));
    set(&mut config.store.repo, get("GITHUB_REPO"));
    set(&mut config.store.token, get("GITHUB_TOKEN"));
    set(&mut config.store.branch, get("GITHUB_BRANCH"));
    set(&mut config.server.admin_key, get("REPODRIVE_ADMIN_KEY"));

    if let Some(port) = get("PORT") {
        let host = config
            .server
            .bind
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        set(&mut config.server.bind, Some(format!("{host}:{}", port.trim())));
    }

    changed
}
