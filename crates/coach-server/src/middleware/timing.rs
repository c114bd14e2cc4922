//! Request timing middleware.
//!
//! Engine searches dominate request latency, so every request is logged
//! with its duration; unusually slow ones are raised to warnings.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Requests slower than this are logged as warnings.
pub const SLOW_REQUEST_MS: u128 = 10_000;

/// Middleware that logs request timing.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware, routing::post};
/// use coach_server::middleware::timing_layer;
///
/// let app = Router::new()
///     .route("/analyze", post(handler))
///     .layer(middleware::from_fn(timing_layer));
/// ```
pub async fn timing_layer(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status().as_u16();

    if duration.as_millis() > SLOW_REQUEST_MS {
        tracing::warn!(
            method = %method,
            path = %uri,
            status = status,
            duration_ms = duration.as_millis() as u64,
            "Slow request"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %uri,
            status = status,
            duration_ms = duration.as_millis() as u64,
            "Request completed"
        );
    }

    response
}
