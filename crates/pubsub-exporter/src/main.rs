//! Redis Pub/Sub Exporter
//!
//! Prometheus exporter for Redis pub/sub channels, patterns, and client
//! subscriptions.
//!
//! # Startup Flow
//!
//! 1. Parse command-line flags (each backed by an environment variable)
//! 2. Initialize tracing (`LOG_FORMAT=json` selects JSON output)
//! 3. Build configuration
//! 4. Create the Redis client (connects lazily on first scrape)
//! 5. Build the collector and HTTP routes
//! 6. Serve until SIGINT/SIGTERM

#![warn(clippy::pedantic)]

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use common::secret::ExposeSecret;
use pubsub_exporter::collector::PubSubCollector;
use pubsub_exporter::config::{Args, Config};
use pubsub_exporter::observability::{BUILD_DATE, COMMIT, VERSION};
use pubsub_exporter::redis::RedisPubSubClient;
use pubsub_exporter::routes::{build_routes, AppState};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Exits here on --help, --version or a malformed flag
    let args = Args::parse();

    init_tracing();

    info!(
        version = VERSION,
        commit = COMMIT,
        date = BUILD_DATE,
        "Starting Redis PubSub Exporter"
    );

    let config = Config::from_args(args).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        redis = %config.redis.address(),
        redis_tls = config.redis.tls,
        listen = %config.listen_address,
        max_channels = config.max_channels,
        known_patterns = ?config.known_patterns,
        hash_metrics = config.hash_metrics.len(),
        "Configuration loaded successfully"
    );

    for def in &config.hash_metrics {
        info!(
            redis_key = %def.redis_key,
            metric = %def.metric_name,
            label = %def.field_label,
            "Hash metric configured"
        );
    }

    // Redis client (lazy connection, first scrape connects)
    let redis_url = config.redis.url().map_err(|e| {
        error!(error = %e, "Failed to build Redis URL");
        e
    })?;
    let store = RedisPubSubClient::new(redis_url.expose_secret()).map_err(|e| {
        error!(error = %e, "Failed to create Redis client");
        e
    })?;

    let collector = Arc::new(PubSubCollector::new(
        Arc::new(store),
        config.max_channels,
        config.known_patterns.clone(),
        config.hash_metrics.clone(),
    ));

    let app = build_routes(Arc::new(AppState { collector }));

    let addr: SocketAddr = config.listen_address.parse().map_err(|e| {
        error!(error = %e, addr = %config.listen_address, "Invalid listen address");
        format!("Invalid listen address {}: {e}", config.listen_address)
    })?;

    // Bind listener before serving to fail fast on bind errors
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!(error = %e, addr = %addr, "Failed to bind HTTP server");
        format!("Failed to bind HTTP server to {addr}: {e}")
    })?;
    info!(addr = %addr, "Listening");

    let shutdown_token = CancellationToken::new();
    let server_token = shutdown_token.child_token();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                server_token.cancelled().await;
                info!("HTTP server shutting down");
            })
            .await
    });

    shutdown_signal().await;
    info!("Shutdown signal received, initiating graceful shutdown...");
    shutdown_token.cancel();

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "HTTP server failed"),
        Err(e) => error!(error = %e, "HTTP server task panicked"),
    }

    info!("Exporter stopped");
    Ok(())
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pubsub_exporter=info,exporter=info,tower_http=info".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed. This is acceptable because
/// without signal handlers, we cannot gracefully shut down the service.
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
