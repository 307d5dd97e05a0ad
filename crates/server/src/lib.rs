//! HTTP surface of the content proxy.
//!
//! `GET` requests that match no registered route fall through to
//! [`routes::browse::browse`], which resolves them to a listing or a file
//! read. Reserved first segments never resolve to file reads.

pub mod error;
pub mod proxy;
pub mod routes;
pub mod state;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use repodrive_core::MAX_UPLOAD_BYTES;

pub use proxy::{ContentProxy, ProxyError};
pub use state::{AppState, ConfigHandle};

/// Multipart framing on top of the largest accepted file.
const UPLOAD_BODY_SLACK: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/config/reload", post(routes::config::reload))
        .route("/update-config", post(routes::config::update))
        .route("/create-folder", post(routes::folders::create_folder))
        .route("/delete", post(routes::delete::delete))
        .route(
            "/upload",
            post(routes::upload::upload)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + UPLOAD_BODY_SLACK)),
        )
        .route("/", get(routes::browse::browse))
        .fallback(routes::browse::browse)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
