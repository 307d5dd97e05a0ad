use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::FromRef;
use tokio::sync::RwLock;

use repodrive_core::validate::require_field;
use repodrive_runtime_config::{self as runtime_config, ProxyConfig, StoreSettings};

use crate::proxy::{ContentProxy, ProxyError};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ContentProxy>,
    pub config: ConfigHandle,
}

impl AppState {
    pub fn new(proxy: ContentProxy, config: ConfigHandle) -> Self {
        Self {
            proxy: Arc::new(proxy),
            config,
        }
    }
}

impl FromRef<AppState> for Arc<ContentProxy> {
    fn from_ref(state: &AppState) -> Self {
        state.proxy.clone()
    }
}

impl FromRef<AppState> for ConfigHandle {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

/// Live configuration, optionally backed by a config file.
///
/// Handlers take a snapshot per request; updates swap the whole store
/// section at once so a request never sees a half-applied change.
#[derive(Clone)]
pub struct ConfigHandle {
    current: Arc<RwLock<ProxyConfig>>,
    path: Option<Arc<PathBuf>>,
}

impl ConfigHandle {
    /// Configuration that lives only in memory.
    pub fn in_memory(config: ProxyConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(config)),
            path: None,
        }
    }

    /// Configuration persisted to `path` on every update.
    pub fn persistent(config: ProxyConfig, path: PathBuf) -> Self {
        Self {
            current: Arc::new(RwLock::new(config)),
            path: Some(Arc::new(path)),
        }
    }

    pub async fn store(&self) -> StoreSettings {
        self.current.read().await.store.clone()
    }

    pub async fn admin_key(&self) -> String {
        self.current.read().await.server.admin_key.clone()
    }

    /// Replace owner, repo and token.
    ///
    /// With a backing file the new configuration is written first, and the
    /// in-memory copy is swapped only when the write succeeded.
    pub async fn update_credentials(
        &self,
        owner: Option<&str>,
        repo: Option<&str>,
        token: Option<&str>,
    ) -> Result<StoreSettings, ProxyError> {
        let owner = require_field("owner", owner)?;
        let repo = require_field("repo", repo)?;
        let token = require_field("token", token)?;

        let mut current = self.current.write().await;
        let mut next = current.clone();
        next.store = current.store.with_credentials(owner, repo, token);

        if let Some(path) = &self.path {
            runtime_config::save_to(path, &next)
                .map_err(|e| ProxyError::Persistence(e.to_string()))?;
        }
        *current = next;
        tracing::info!(
            "store configuration updated: {}/{}",
            current.store.owner,
            current.store.repo
        );
        Ok(current.store.clone())
    }

    /// Re-read the backing file, replacing the store section and admin key.
    ///
    /// The bind address is fixed at startup and is not reloaded. Returns
    /// whether the reloaded store configuration is complete.
    pub async fn reload(&self) -> Result<bool, ProxyError> {
        let Some(path) = &self.path else {
            return Err(ProxyError::InvalidInput(
                "no configuration file to reload from".to_string(),
            ));
        };
        let loaded =
            runtime_config::load_from(path).map_err(|e| ProxyError::Persistence(e.to_string()))?;

        let mut current = self.current.write().await;
        current.store = loaded.store;
        current.server.admin_key = loaded.server.admin_key;
        tracing::info!("configuration reloaded from {}", path.display());
        Ok(current.store.is_complete())
    }
}
