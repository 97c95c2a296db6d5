//! HTTP routes for the exporter.
//!
//! Defines the Axum router and application state.

use crate::collector::{MetricSink, PubSubCollector};
use crate::observability::{build_info, health_router, PrometheusSink, VERSION};
use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Content type of the Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Scrape orchestrator; one `collect` per `/metrics` request.
    pub collector: Arc<PubSubCollector>,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/metrics` - Prometheus scrape endpoint
/// - `/healthz`, `/readyz` - Kubernetes probes
/// - `/` - Landing page
/// - TraceLayer for request logging
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>) -> Router {
    let scrape_routes = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/", get(landing_handler))
        .with_state(Arc::clone(&state));

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    scrape_routes
        .merge(health_router(Arc::clone(&state.collector)))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}

/// Handler for GET /metrics
///
/// Runs one scrape and renders it, together with the build info gauge, in
/// the Prometheus text format. Always 200; a Redis outage shows up as
/// `redis_pubsub_exporter_redis_up 0`.
#[tracing::instrument(skip_all, name = "exporter.http.metrics")]
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut sink = PrometheusSink::new();
    state.collector.collect(&mut sink).await;
    sink.accept(build_info());

    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        sink.render(),
    )
}

/// Handler for GET /
async fn landing_handler() -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>Redis PubSub Exporter</title></head>\n\
         <body>\n\
         <h1>Redis PubSub Exporter</h1>\n\
         <p>Version: {VERSION}</p>\n\
         <p><a href=\"/metrics\">Metrics</a></p>\n\
         <p><a href=\"/healthz\">Health</a></p>\n\
         <p><a href=\"/readyz\">Ready</a></p>\n\
         </body>\n\
         </html>"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn test_landing_page_links_endpoints() {
        let Html(body) = landing_handler().await;
        assert!(body.contains(r#"href="/metrics""#));
        assert!(body.contains(r#"href="/healthz""#));
        assert!(body.contains(r#"href="/readyz""#));
        assert!(body.contains(VERSION));
    }
}
