//! Infrad - infrastructure service
//!
//! Namespaced caching, priority queues, and telemetry behind an HTTP API.

mod api;
mod backend;
mod cache;
mod config;
mod error;
mod models;
mod queue;
mod stats;
mod tasks;
mod telemetry;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{create_router, AppState};
use backend::{create_backend, Backend, MemoryBackend};
use config::Config;
use tasks::{spawn_cleanup_task, spawn_flush_task, spawn_retry_task};
use telemetry::TelemetryCollector;

/// Main entry point for the infrastructure service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Construct the storage backend, then connect it (no I/O in constructors)
/// 4. Build cache/queue/telemetry services and share them as app state
/// 5. Start background tasks (TTL sweep, retry promotion, telemetry flush)
/// 6. Start HTTP server on configured port
/// 7. On SIGINT/SIGTERM, stop tasks and flush remaining telemetry
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "infrad=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting infrad");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={:?}, capacity={}, default_ttl={}s, port={}",
        config.backend, config.cache_capacity, config.default_ttl, config.server_port
    );

    // Two-phase backend lifecycle: construct without I/O, then connect.
    // A backend that cannot connect at startup is replaced by the in-memory
    // variant so the service stays available.
    let backend: Arc<dyn Backend> = match create_backend(&config) {
        Ok(backend) => match backend.connect().await {
            Ok(()) => {
                info!("{} backend connected", backend.name());
                backend
            }
            Err(err) => {
                warn!(
                    backend = backend.name(),
                    error = %err,
                    "backend connect failed, falling back to in-memory storage"
                );
                Arc::new(MemoryBackend::new())
            }
        },
        Err(err) => {
            warn!(error = %err, "backend configuration invalid, using in-memory storage");
            Arc::new(MemoryBackend::new())
        }
    };

    // Build explicit service instances and share them via app state
    let state = AppState::from_config(&config, backend);
    info!("Services initialized");

    // Start background tasks
    let task_handles = vec![
        spawn_cleanup_task(state.cache.clone(), config.cleanup_interval),
        spawn_retry_task(state.queue.clone(), config.retry_sweep_interval),
        spawn_flush_task(state.telemetry.clone(), config.telemetry_flush_interval),
    ];
    info!("Background tasks started");

    // Create router with all endpoints
    let telemetry = state.telemetry.clone();
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(task_handles, telemetry))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown, stops the background tasks and drains any telemetry still
/// sitting in the buffer.
async fn shutdown_signal(task_handles: Vec<JoinHandle<()>>, telemetry: Arc<TelemetryCollector>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for handle in task_handles {
        handle.abort();
    }

    match telemetry.flush().await {
        Ok(flushed) if flushed > 0 => info!(flushed, "final telemetry flush complete"),
        Ok(_) => info!("no telemetry left to flush"),
        Err(err) => warn!(error = %err, "final telemetry flush failed"),
    }
}
