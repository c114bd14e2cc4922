//! Chess Coach Server Library
//!
//! An Axum-based service exposing:
//! - `POST /analyze` - best move and evaluation from a UCI engine
//! - `POST /explain` - natural-language explanation of a move
//! - `GET /health` - liveness check

pub mod api;
pub mod commentary;
pub mod config;
pub mod error;
pub mod middleware;

use axum::routing::{get, post};
use axum::Router;
use commentary::CommentaryGenerator;
use engine_session::Analyzer;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Spawns one engine process per analysis request.
    pub analyzer: Arc<Analyzer>,
    /// Shared text-generation client behind the explain endpoint.
    pub commentary: Arc<CommentaryGenerator>,
}

/// Health check endpoint.
///
/// Returns "ok" to indicate the server is running.
pub async fn health() -> &'static str {
    "ok"
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    // Browsers load the frontend from anywhere, including file://
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(api::analysis::analyze))
        .route("/explain", post(api::commentary::explain))
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::timing_layer))
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_returns_ok() {
        let result = health().await;
        assert_eq!(result, "ok");
    }
}
