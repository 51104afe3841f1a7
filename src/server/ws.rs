use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::ServerState;
use crate::bus::PublishedEvent;
use crate::transport::decode_envelope;

pub(super) async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    // Subscribe before the upgrade completes so nothing published after the
    // client sees the handshake response is missed.
    let rx = state.bus.subscribe();
    let shutdown = state.shutdown_signal();
    ws.on_upgrade(move |socket| handle_socket(socket, rx, shutdown, state))
}

async fn handle_socket(
    socket: WebSocket,
    mut rx: broadcast::Receiver<PublishedEvent>,
    mut shutdown: watch::Receiver<bool>,
    state: ServerState,
) {
    let client_id = Uuid::new_v4().to_string();
    info!(%client_id, "push client connected");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            _ = server_stopping(&mut shutdown) => {
                if let Err(e) = sender.send(Message::Close(None)).await {
                    debug!(%client_id, "failed to send close frame: {e}");
                }
                break;
            }
            event = rx.recv() => match event {
                Ok(event) => {
                    let text = match serde_json::to_string(&event.envelope) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(seq = event.seq, "failed to encode push event: {e}");
                            continue;
                        }
                    };
                    if let Err(e) = sender.send(Message::Text(text)).await {
                        debug!(%client_id, "push send failed: {e}");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(%client_id, "push client lagged, dropped {n} events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => handle_client_text(&state, &client_id, &text),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(%client_id, "push socket error: {e}");
                    break;
                }
            },
        }
    }

    info!(%client_id, "push client disconnected");
}

/// Client messages are logged; ones that decode as envelopes are re-broadcast.
fn handle_client_text(state: &ServerState, client_id: &str, text: &str) {
    debug!(%client_id, "received client message: {text}");
    match decode_envelope(text) {
        Ok(envelope) => {
            let receipt = state.bus.publish(envelope);
            debug!(%client_id, seq = receipt.seq, "re-broadcast client message");
        }
        Err(e) => debug!(%client_id, "ignoring client message: {e}"),
    }
}

async fn server_stopping(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stopping| *stopping).await;
}
