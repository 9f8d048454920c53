//! # Stockroom API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  config ──► AppState::initialize ──► ReservationSweeper (background)  │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │            axum::serve (8080) ──► SIGINT / SIGTERM ──► sweeper stop    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stockroom_api::{build_router, init_tracing, ApiConfig, AppState};
use stockroom_engine::ReservationSweeper;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Stockroom API server...");

    let config = ApiConfig::load()?;
    info!(
        addr = %config.bind_addr(),
        database = %config.database_path,
        reservation_ttl_secs = config.reservation_ttl_secs,
        "Configuration loaded"
    );

    let sweeper_config = config.sweeper_config();
    let addr = config.bind_addr();

    let state = AppState::initialize(config).await?;
    info!("Database ready");

    let (sweeper, sweeper_task) = ReservationSweeper::spawn(state.ledger().clone(), sweeper_config);
    let db = state.db.clone();

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.shutdown().await;
    if let Err(e) = sweeper_task.await {
        error!(error = %e, "Reservation sweeper task failed");
    }
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
