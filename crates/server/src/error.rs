use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::proxy::ProxyError;

/// Unified API error type.
///
/// Produces `{"error": "<message>"}` JSON responses.
#[derive(Debug)]
pub struct ApiErr {
    status: StatusCode,
    message: String,
}

impl ApiErr {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ProxyError> for ApiErr {
    fn from(err: ProxyError) -> Self {
        let status = match &err {
            ProxyError::ConfigurationMissing | ProxyError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::SensitiveContentRejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ProxyError::Remote { .. } | ProxyError::Transport(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Persistence(_) => {
                tracing::error!("{err}");
                return Self::internal("failed to persist configuration");
            }
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({"error": self.message})),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_errors_map_to_statuses() {
        let cases = [
            (ProxyError::ConfigurationMissing, StatusCode::BAD_REQUEST),
            (
                ProxyError::InvalidInput("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ProxyError::PayloadTooLarge { size: 2, limit: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                ProxyError::SensitiveContentRejected {
                    reason: "private key header".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ProxyError::Remote {
                    status: 404,
                    message: "Not Found".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                ProxyError::Persistence("disk full".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiErr::from(err).status(), status);
        }
    }

    #[test]
    fn remote_message_is_carried_through() {
        let err = ApiErr::from(ProxyError::Remote {
            status: 409,
            message: "sha does not match".into(),
        });
        assert!(err.message.contains("409"));
        assert!(err.message.contains("sha does not match"));
    }
}
