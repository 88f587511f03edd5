//! Application builder: wires router, middleware and state into an Axum app
//! and runs it until shutdown.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use bytecloud_auth::{IdentityProvider, SessionGate};
use bytecloud_core::config::AppConfig;
use bytecloud_core::error::AppError;
use bytecloud_database::FileRepository;

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// How often expired pending sign-ups are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let server = &state.config.server;
    let cors = build_cors_layer(&server.cors);
    let timeout = Duration::from_secs(server.request_timeout_seconds);

    build_router(state)
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(request_logging))
}

/// Runs the ByteCloud server until Ctrl-C or SIGTERM.
///
/// Spawns the session-gate loader and the pending sign-up sweeper, then
/// serves until a shutdown signal arrives. In-flight requests get
/// `server.shutdown_grace_seconds` to finish.
pub async fn run_server(
    config: AppConfig,
    file_repo: Arc<dyn FileRepository>,
    provider: Arc<dyn IdentityProvider>,
) -> Result<(), AppError> {
    info!("Starting ByteCloud server...");

    let gate = SessionGate::new();
    let retry = Duration::from_secs(config.auth.gate_retry_seconds);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState::new(config, file_repo, Arc::clone(&provider), gate.clone());
    let loader = gate.spawn_load(provider, retry);
    let sweeper = Arc::clone(&state.sign_ups).spawn_sweeper(SWEEP_INTERVAL);

    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    info!(%addr, "ByteCloud server listening");

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .into_future();

    let result = tokio::select! {
        result = server => result.map_err(|e| AppError::internal(format!("Server error: {e}"))),
        _ = async {
            let _ = shutdown_rx.wait_for(|stopping| *stopping).await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(grace_seconds = grace.as_secs(), "Shutdown grace period elapsed, dropping connections");
            Ok(())
        }
    };

    loader.abort();
    sweeper.abort();
    info!("ByteCloud server stopped");
    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
