//! Push source: the HTTP/WebSocket side of real-time delivery.
//!
//! - `GET /ws`: WebSocket stream of every envelope published after connect
//! - `POST /api/notifications`: publish one envelope to all connected clients
//! - `GET /health`: liveness check

mod api;
mod ws;

use std::future::Future;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::bus::EventBus;

pub use api::ApiResponse;

/// Well-known path push clients connect to.
pub const WS_PATH: &str = "/ws";

#[derive(Clone)]
pub struct ServerState {
    pub bus: Arc<EventBus>,
    /// Flips to `true` when the server stops; open sockets close on it.
    shutdown: Arc<watch::Sender<bool>>,
}

impl ServerState {
    pub fn new(bus: Arc<EventBus>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            bus,
            shutdown: Arc::new(shutdown),
        }
    }

    pub(crate) fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route(WS_PATH, get(ws::ws_handler))
        .route("/api/notifications", post(api::publish_notification))
        .with_state(state)
}

/// Serve until `shutdown` resolves, then close every open push socket.
pub async fn serve<F>(listener: TcpListener, state: ServerState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let sockets = state.shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("push server shutting down, closing push sockets");
            sockets.send_replace(true);
        })
        .await
}
