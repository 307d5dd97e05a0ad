use std::sync::Arc;

use axum::{Form, extract::State, response::Redirect};
use serde::Deserialize;

use repodrive_core::paths;
use repodrive_core::validate::require_field;

use crate::error::ApiErr;
use crate::proxy::{ContentProxy, ProxyError};
use crate::state::ConfigHandle;

#[derive(Debug, Deserialize)]
pub struct CreateFolderForm {
    #[serde(default)]
    pub path: String,
    #[serde(rename = "folderName")]
    pub folder_name: Option<String>,
}

/// POST /create-folder: create `folderName` inside `path`.
pub async fn create_folder(
    State(proxy): State<Arc<ContentProxy>>,
    State(config): State<ConfigHandle>,
    Form(form): Form<CreateFolderForm>,
) -> Result<Redirect, ApiErr> {
    let settings = config.store().await;
    proxy.require_target(&settings)?;

    let name =
        require_field("folderName", form.folder_name.as_deref()).map_err(ProxyError::from)?;
    let directory = paths::normalize_route_path(&form.path);
    let directory = proxy.mkdir(&settings, &directory, name).await?;
    Ok(Redirect::to(&paths::listing_url(&directory)))
}
