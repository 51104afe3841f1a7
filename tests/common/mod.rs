// tests/common/mod.rs
//! Common test utilities for push integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use coopwatch_lib::bus::EventBus;
use coopwatch_lib::notifications::NotificationCenter;
use coopwatch_lib::server::{self, ServerState};
use coopwatch_lib::transport::ConnectionState;

pub const WAIT: Duration = Duration::from_secs(5);

/// A push server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub bus: Arc<EventBus>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
        Self::start_on(listener).await
    }

    pub async fn start_on(listener: TcpListener) -> Self {
        let addr = listener.local_addr().expect("listener address");
        let bus = Arc::new(EventBus::new());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(server::serve(
            listener,
            ServerState::new(bus.clone()),
            async move {
                let _ = shutdown_rx.await;
            },
        ));
        Self {
            addr,
            bus,
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}{}", self.addr, server::WS_PATH)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(WAIT, &mut self.task).await;
    }
}

/// A WebSocket server at `/ws` that sends `frames` verbatim to each client.
pub async fn spawn_scripted_server(frames: Vec<String>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind scripted listener");
    let addr = listener.local_addr().expect("listener address");

    let app = Router::new().route(
        "/ws",
        get(move |ws: WebSocketUpgrade| {
            let frames = frames.clone();
            async move {
                ws.on_upgrade(move |mut socket| async move {
                    for frame in frames {
                        if socket.send(Message::Text(frame)).await.is_err() {
                            return;
                        }
                    }
                    while let Some(Ok(_)) = socket.recv().await {}
                })
            }
        }),
    );

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Reserve a local port that nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind throwaway listener");
    listener.local_addr().expect("listener address")
}

/// Wait until the client reports a state matching `wanted` and return it.
pub async fn wait_for_state(
    state: &mut watch::Receiver<ConnectionState>,
    wanted: impl Fn(&ConnectionState) -> bool,
) -> ConnectionState {
    tokio::time::timeout(WAIT, state.wait_for(|s| wanted(s)))
        .await
        .expect("timed out waiting for connection state")
        .map(|s| *s)
        .expect("push client state channel closed")
}

pub async fn wait_for_subscribers(bus: &EventBus, count: usize) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while bus.subscriber_count() != count {
        if tokio::time::Instant::now() > deadline {
            panic!(
                "timed out waiting for {count} bus subscribers, have {}",
                bus.subscriber_count()
            );
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub async fn wait_for_len(center: &NotificationCenter, len: usize) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while center.len() < len {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {len} notifications, have {}", center.len());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
