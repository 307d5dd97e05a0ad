use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    response::Redirect,
};

use repodrive_core::{UploadRequest, paths};

use crate::error::ApiErr;
use crate::proxy::ContentProxy;
use crate::state::ConfigHandle;

/// POST /upload: multipart form with `path` (target directory) and `file`.
///
/// Redirects to the target directory's listing on success.
pub async fn upload(
    State(proxy): State<Arc<ContentProxy>>,
    State(config): State<ConfigHandle>,
    mut multipart: Multipart,
) -> Result<Redirect, ApiErr> {
    let settings = config.store().await;
    proxy.require_target(&settings)?;

    let mut directory = String::new();
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiErr::new(e.status(), e.body_text()))?
    {
        match field.name() {
            Some("path") => {
                directory = field
                    .text()
                    .await
                    .map_err(|e| ApiErr::new(e.status(), e.body_text()))?;
            }
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let mime = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiErr::new(e.status(), e.body_text()))?;
                file = Some((name, mime, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let Some((file_name, mime_hint, bytes)) = file else {
        return Err(ApiErr::bad_request("no file selected"));
    };

    let request = UploadRequest {
        target_directory: paths::normalize_route_path(&directory),
        file_name,
        bytes,
        mime_hint,
    };
    let directory = proxy.write(&settings, request).await?;
    Ok(Redirect::to(&paths::listing_url(&directory)))
}
