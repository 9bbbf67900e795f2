pub mod engine;
pub mod error;
pub mod msgs;
pub mod sdp_handler;

use std::path::Path;

use axum::{
    routing::{any, delete, get},
    Router,
};
use tower_http::services::ServeDir;

use crate::app::AppState;
use sdp_handler::{close_session_handler, health_handler, sdp_handler};

/// Signaling routes with `static_dir` served as the fallback.
pub fn router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        // method check happens in the handler so the 405 carries a message
        .route("/sdp", any(sdp_handler))
        .route("/sdp/:session_id", delete(close_session_handler))
        .route("/health", get(health_handler))
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .with_state(state)
}
