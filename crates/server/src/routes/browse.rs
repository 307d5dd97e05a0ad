use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use repodrive_core::paths::{self, GetTarget};

use crate::error::ApiErr;
use crate::proxy::{ContentProxy, FileDownload};
use crate::state::ConfigHandle;

#[derive(Debug, Default, Deserialize)]
pub struct ReadQuery {
    #[serde(default)]
    pub download: Option<String>,
}

impl ReadQuery {
    fn wants_download(&self) -> bool {
        self.download.as_deref() == Some("true")
    }
}

/// GET `/`, `/tree/*`, `/file/*` and every other non-reserved path.
///
/// Registered on `/` and as the router fallback; [`paths::resolve_get`]
/// decides between listing, reading and refusing a reserved path.
pub async fn browse(
    State(proxy): State<Arc<ContentProxy>>,
    State(config): State<ConfigHandle>,
    method: Method,
    uri: Uri,
    Query(query): Query<ReadQuery>,
) -> Result<Response, ApiErr> {
    if method != Method::GET && method != Method::HEAD {
        return Err(ApiErr::not_found("Not Found"));
    }

    let decoded = urlencoding::decode(uri.path())
        .map_err(|_| ApiErr::bad_request("request path is not valid UTF-8"))?;
    let settings = config.store().await;

    match paths::resolve_get(&decoded) {
        GetTarget::List(path) => {
            let listing = proxy.list(&settings, &path).await?;
            Ok(Json(listing).into_response())
        }
        GetTarget::Read(path) => {
            let file = proxy
                .read(&settings, &path, query.wants_download())
                .await?;
            Ok(file_response(file))
        }
        GetTarget::Reserved(_) => Err(ApiErr::not_found("Not Found")),
    }
}

fn file_response(file: FileDownload) -> Response {
    let mut headers = HeaderMap::new();
    for (name, value) in &file.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }
    if file.attachment {
        if let Ok(value) = HeaderValue::from_str(&content_disposition(&file.file_name)) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }
    (StatusCode::OK, headers, file.bytes).into_response()
}

/// `attachment` disposition with an ASCII fallback name and an RFC 5987 UTF-8 name.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if fallback == file_name {
        format!("attachment; filename=\"{file_name}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            urlencoding::encode(file_name)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_names_use_plain_filename() {
        assert_eq!(
            content_disposition("cat.png"),
            "attachment; filename=\"cat.png\""
        );
    }

    #[test]
    fn non_ascii_names_get_encoded_variant() {
        let value = content_disposition("图片.png");
        assert!(value.starts_with("attachment; filename=\"__.png\""));
        assert!(value.contains("filename*=UTF-8''%E5%9B%BE%E7%89%87.png"));
        assert!(HeaderValue::from_str(&value).is_ok());
    }

    #[test]
    fn quotes_are_replaced_in_fallback() {
        let value = content_disposition("a\"b.txt");
        assert!(value.starts_with("attachment; filename=\"a_b.txt\""));
    }

    #[test]
    fn download_flag_requires_true() {
        let yes = ReadQuery {
            download: Some("true".into()),
        };
        let no = ReadQuery {
            download: Some("1".into()),
        };
        assert!(yes.wants_download());
        assert!(!no.wants_download());
        assert!(!ReadQuery::default().wants_download());
    }
}
