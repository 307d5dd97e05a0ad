use std::sync::Arc;
use std::time::Duration;

use repodrive_api_client::GitHubContentClient;
use repodrive_runtime_config as runtime_config;
use repodrive_server::{AppState, ConfigHandle, ContentProxy, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repodrive_server=info,tower_http=info".into()),
        )
        .init();

    let config_path = runtime_config::config_path();
    let mut config = runtime_config::load_from(&config_path)?;
    if runtime_config::apply_env_overrides(&mut config, |key| std::env::var(key).ok()) {
        tracing::info!("environment overrides applied");
    }
    tracing::info!("configuration file: {}", config_path.display());

    if config.store.is_complete() {
        tracing::info!(
            "serving {}/{} on branch {}",
            config.store.owner,
            config.store.repo,
            config.store.branch
        );
    } else {
        tracing::warn!("store not configured; data routes will fail until POST /update-config");
    }

    let client = GitHubContentClient::new(
        &config.store.api_base_url,
        &config.store.raw_base_url,
        Duration::from_secs(config.server.request_timeout_secs),
    )?;
    let bind = config.server.bind.clone();

    let proxy = ContentProxy::new(Arc::new(client));
    let state = AppState::new(proxy, ConfigHandle::persistent(config, config_path));
    let app = build_router(state);

    tracing::info!("starting server at {bind}");
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
