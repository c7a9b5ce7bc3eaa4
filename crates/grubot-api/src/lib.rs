pub mod error;
pub mod routes;
pub mod signature;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use grubot_core::AppState;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

/// Largest webhook body accepted.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;
pub const MAX_CONCURRENT_REQUESTS: usize = 256;

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route(
            "/webhook",
            get(routes::webhook::verify).post(routes::webhook::receive),
        )
        .route("/authorize", get(routes::authorize::authorize))
        .route("/health", get(routes::health::health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
        .layer(TraceLayer::new_for_http())
}
