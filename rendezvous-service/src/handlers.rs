// ============================================================================
// HTTP Handlers
// ============================================================================
//
// Thin adapter between the HTTP surface and the relay engine. The relay
// endpoints answer 200 on every path, including internal failure; anomalies
// are visible only in logs and metrics. The operator endpoints (health,
// metrics) live on a separate listener and may report degradation.
//
// ============================================================================

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State, rejection::BytesRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use beacon_types::Envelope;
use serde_json::json;

use crate::RelayContext;
use crate::core::FetchResult;

/// Acknowledgement body for every submission.
const ACK_BODY: &str = "OK\n";

/// Fixed marker returned for the reserved diagnostic key.
const LIVENESS_BODY: &str = "Connection OK\n";

/// Expired date emitted alongside Cache-Control to defeat stale proxies.
const EXPIRES_IN_THE_PAST: &str = "Fri, 01 Jan 1990 00:00:00 GMT";

fn no_cache_headers() -> [(header::HeaderName, &'static str); 3] {
    [
        (header::CONTENT_TYPE, "application/json"),
        (header::CACHE_CONTROL, "no-cache, must-revalidate"),
        (header::EXPIRES, EXPIRES_IN_THE_PAST),
    ]
}

// ============================================================================
// Relay surface
// ============================================================================

/// POST on any path deposits an envelope.
///
/// Malformed, oversized or keyless bodies are logged and acknowledged
/// anyway: the relay is best-effort and the submitter gets the same answer
/// no matter what happened.
pub async fn submit(
    State(context): State<Arc<RelayContext>>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    match body {
        Ok(raw) => match serde_json::from_slice::<Envelope>(&raw) {
            Ok(envelope) => {
                context.engine.submit(envelope).await;
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring unparsable submission body"),
        },
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable submission body"),
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        ACK_BODY,
    )
}

/// GET with a path: the last segment is the rendezvous key.
pub async fn fetch(
    State(context): State<Arc<RelayContext>>,
    Path(path): Path<String>,
) -> impl IntoResponse {
    let key = path.rsplit('/').next().unwrap_or_default();
    let result = context.engine.fetch(key).await;
    render_fetch(result)
}

/// GET on the bare root: nothing to look up, empty answer.
pub async fn fetch_root() -> impl IntoResponse {
    render_fetch(FetchResult::Empty)
}

fn render_fetch(result: FetchResult) -> impl IntoResponse {
    let body = match result {
        FetchResult::Liveness => LIVENESS_BODY.as_bytes().to_vec(),
        FetchResult::Found(raw) => raw,
        FetchResult::Empty => Vec::new(),
    };
    (StatusCode::OK, no_cache_headers(), body)
}

/// OPTIONS on any path. The CORS layer answers real preflights before this
/// handler runs; a bare OPTIONS still gets an empty 200, as callers expect.
pub async fn preflight() -> impl IntoResponse {
    StatusCode::OK
}

// ============================================================================
// Operator surface
// ============================================================================

/// Liveness probe
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// Readiness probe: verifies the store is reachable
pub async fn health_ready(State(context): State<Arc<RelayContext>>) -> impl IntoResponse {
    match context.engine.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "ok"}))),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "degraded"})),
            )
        }
    }
}

/// Prometheus exposition
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        beacon_metrics::gather(),
    )
}
