use std::sync::Arc;

use axum::{
    Form, Json,
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use repodrive_core::{DeleteRequest, EntryKind, paths};

use crate::error::ApiErr;
use crate::proxy::ContentProxy;
use crate::state::ConfigHandle;

/// Number of children a directory delete could not remove.
pub const DELETE_FAILED_HEADER: &str = "x-repodrive-delete-failed";

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// POST /delete: delete a file, or the immediate children of a directory.
///
/// Answers with a 303 to the parent listing and the per-path report as body.
pub async fn delete(
    State(proxy): State<Arc<ContentProxy>>,
    State(config): State<ConfigHandle>,
    Form(form): Form<DeleteForm>,
) -> Result<Response, ApiErr> {
    let kind = EntryKind::from_form(&form.kind)
        .ok_or_else(|| ApiErr::bad_request(format!("unknown delete type: {:?}", form.kind)))?;
    let path = paths::normalize_route_path(&form.path);
    let settings = config.store().await;

    let request = DeleteRequest {
        path: path.clone(),
        kind,
    };
    let report = proxy.delete(&settings, &request).await?;

    let location = paths::listing_url(&paths::parent_of(&path));
    let location = HeaderValue::from_str(&location)
        .map_err(|_| ApiErr::internal("invalid redirect location"))?;
    let failed = HeaderValue::from(report.failed.len());
    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, location),
            (HeaderName::from_static(DELETE_FAILED_HEADER), failed),
        ],
        Json(report),
    )
        .into_response())
}
