// ============================================================================
// Routes
// ============================================================================

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::header,
    routing::get,
};
use beacon_config::MAX_ENVELOPE_SIZE;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::RelayContext;
use crate::handlers;

/// The relay surface: every path is either a submission target (POST), a
/// lookup (GET, keyed by the last path segment) or a preflight (OPTIONS).
pub fn create_router(context: Arc<RelayContext>) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::fetch_root)
                .post(handlers::submit)
                .options(handlers::preflight),
        )
        .route(
            "/*path",
            get(handlers::fetch)
                .post(handlers::submit)
                .options(handlers::preflight),
        )
        .layer(DefaultBodyLimit::max(MAX_ENVELOPE_SIZE))
        // Order matters - last added runs first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer()),
        )
        .with_state(context)
}

/// Health and metrics, served on the separate operator port.
pub fn create_operator_router(context: Arc<RelayContext>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/health/live", get(handlers::health))
        .route("/health/ready", get(handlers::health_ready))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE])
}
