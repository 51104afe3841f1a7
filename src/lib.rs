//! Farm notification hub backend library.
//!
//! Real-time notifications for the poultry farm administration system:
//! emergency alerts, production reports, inventory alerts and batches that
//! are ready for slaughter are pushed to connected clients, which keep them
//! in a bounded notification store behind a drawer.
//!
//! # Architecture
//!
//! - `bus`: Event taxonomy and the in-process broadcast bus
//! - `server`: axum push source (`/ws`, `/api/notifications`, `/health`)
//! - `transport`: Envelope decoding and the WebSocket push client
//! - `notifications`: The notification store and its shared handle
//! - `drawer`: Terminal drawer that renders and drives the store
//! - `config`: Environment configuration

pub mod bus;
pub mod config;
pub mod drawer;
pub mod notifications;
pub mod server;
pub mod transport;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tokio::net::TcpListener;

use bus::EventBus;
use config::{Config, ConfigError};
use server::ServerState;

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Shared helper functions
// ---------------------------------------------------------------------------

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("coopwatch=debug,coopwatch_lib=debug,info"));
    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

// ---------------------------------------------------------------------------
// Application entry point
// ---------------------------------------------------------------------------

/// Run the push server until Ctrl-C.
pub async fn run() -> Result<(), AppError> {
    init_tracing();

    let config = Config::from_env()?;
    let bus = Arc::new(EventBus::new());
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        "coopwatch push server listening on {} (push path {})",
        listener.local_addr()?,
        server::WS_PATH
    );

    server::serve(listener, ServerState::new(bus), shutdown_signal()).await?;

    tracing::info!("coopwatch push server stopped");
    Ok(())
}
