//! Health endpoints for the exporter.
//!
//! Provides Kubernetes-compatible health endpoints:
//! - `GET /healthz` - Liveness probe (is the process running?)
//! - `GET /readyz` - Readiness probe (did the last scrape reach Redis?)
//!
//! Readiness reflects the most recent completed scrape. Before the first
//! scrape the exporter reports not ready.

use crate::collector::PubSubCollector;
use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::sync::Arc;

/// Create the health router with liveness and readiness endpoints.
pub fn health_router(collector: Arc<PubSubCollector>) -> Router {
    Router::new()
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .with_state(collector)
}

/// Liveness probe handler. Always 200 while the process serves requests.
async fn liveness_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness probe handler.
///
/// Returns 503 Service Unavailable until a scrape succeeds, and again after
/// any scrape fails.
async fn readiness_handler(
    State(collector): State<Arc<PubSubCollector>>,
) -> (StatusCode, &'static str) {
    if collector.is_up().await {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "redis not reachable")
    }
}
