use axum::{Form, Json, extract::State, http::HeaderMap, response::Redirect};
use serde::{Deserialize, Serialize};

use crate::error::ApiErr;
use crate::state::ConfigHandle;

pub const ADMIN_KEY_HEADER: &str = "X-Repodrive-Admin-Key";

#[derive(Debug, Deserialize)]
pub struct UpdateConfigForm {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub ok: bool,
    pub configured: bool,
}

async fn check_admin_key(config: &ConfigHandle, headers: &HeaderMap) -> Result<(), ApiErr> {
    let expected = config.admin_key().await;
    let expected = expected.trim();
    if expected.is_empty() {
        return Ok(());
    }
    let provided = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .unwrap_or("");
    if provided != expected {
        return Err(ApiErr::unauthorized("invalid admin key"));
    }
    Ok(())
}

/// POST /update-config: replace owner, repo and token, then go back to `/`.
pub async fn update(
    State(config): State<ConfigHandle>,
    headers: HeaderMap,
    Form(form): Form<UpdateConfigForm>,
) -> Result<Redirect, ApiErr> {
    check_admin_key(&config, &headers).await?;
    config
        .update_credentials(
            form.owner.as_deref(),
            form.repo.as_deref(),
            form.token.as_deref(),
        )
        .await?;
    Ok(Redirect::to("/"))
}

/// POST /api/config/reload: re-read the configuration file.
pub async fn reload(
    State(config): State<ConfigHandle>,
    headers: HeaderMap,
) -> Result<Json<ReloadResponse>, ApiErr> {
    check_admin_key(&config, &headers).await?;
    let configured = config.reload().await?;
    Ok(Json(ReloadResponse {
        ok: true,
        configured,
    }))
}
