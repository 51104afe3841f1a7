//! WebSocket push client.
//!
//! Connects to the push source, decodes each frame into an `EventEnvelope`
//! and feeds it to the `NotificationCenter` in receipt order. Malformed
//! frames are logged and dropped. Connection status is surfaced through a
//! `watch` channel and reconnection follows a `ReconnectPolicy`.

use std::fmt;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::envelope::decode_envelope;
use crate::notifications::NotificationCenter;

/// Base delay for exponential backoff (milliseconds).
pub const RECONNECT_BASE_DELAY_MS: u64 = 100;

/// Maximum delay for exponential backoff (milliseconds).
pub const RECONNECT_MAX_DELAY_MS: u64 = 10_000;

/// Default number of consecutive failed attempts before giving up.
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 10;

// ============================================================================
// Connection State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// First connection attempt in progress.
    Connecting,
    /// Socket open, events are flowing into the store.
    Connected,
    /// Waiting out a backoff delay or retrying after a disconnect.
    Reconnecting { attempt: u32 },
    /// Connection lost; a retry may follow.
    Disconnected,
    /// The client stopped and will not reconnect.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Reconnecting { attempt } => write!(f, "reconnecting (attempt {attempt})"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    /// Consecutive failed attempts allowed before the client closes.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Exponential backoff delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.pow(attempt.min(10));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            base_delay: Duration::from_millis(RECONNECT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(RECONNECT_MAX_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `ws://` URL of the push source.
    pub url: String,
    pub reconnect: ReconnectPolicy,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect: ReconnectPolicy::default(),
        }
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }
}

// ============================================================================
// Client
// ============================================================================

/// Handle to a running push client task.
///
/// Dropping the handle signals the task to stop; `close` also waits for it.
pub struct PushClient {
    state: watch::Receiver<ConnectionState>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PushClient {
    /// Start the connection loop on the current tokio runtime.
    pub fn spawn(config: ClientConfig, center: NotificationCenter) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_client(config, center, state_tx, shutdown_rx));
        Self {
            state: state_rx,
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Close the connection and wait for the client task to finish.
    pub async fn close(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("push client task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for PushClient {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

// ============================================================================
// Connection loop
// ============================================================================

enum SessionEnd {
    Shutdown,
    Disconnected(String),
}

async fn run_client(
    config: ClientConfig,
    center: NotificationCenter,
    state: watch::Sender<ConnectionState>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut attempt: u32 = 0;

    loop {
        let connected = tokio::select! {
            _ = wait_for_shutdown(&mut shutdown) => break,
            result = connect_async(config.url.as_str()) => result,
        };

        match connected {
            Ok((stream, _response)) => {
                attempt = 0;
                let _ = state.send(ConnectionState::Connected);
                info!("connected to push source at {}", config.url);

                match pump(stream, &center, &mut shutdown).await {
                    SessionEnd::Shutdown => break,
                    SessionEnd::Disconnected(reason) => {
                        warn!("push connection to {} lost: {reason}", config.url);
                    }
                }
            }
            Err(e) => {
                warn!("failed to connect to push source at {}: {e}", config.url);
            }
        }

        let _ = state.send(ConnectionState::Disconnected);

        if !config.reconnect.enabled {
            break;
        }
        if attempt >= config.reconnect.max_attempts {
            warn!(
                "giving up on push source after {} reconnection attempts",
                config.reconnect.max_attempts
            );
            break;
        }

        let delay = config.reconnect.delay_for(attempt);
        attempt += 1;
        let _ = state.send(ConnectionState::Reconnecting { attempt });
        debug!("reconnecting to push source in {delay:?} (attempt {attempt})");

        tokio::select! {
            _ = wait_for_shutdown(&mut shutdown) => break,
            _ = sleep(delay) => {}
        }
    }

    let _ = state.send(ConnectionState::Closed);
    info!("push client closed");
}

async fn pump(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    center: &NotificationCenter,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionEnd {
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            _ = wait_for_shutdown(shutdown) => {
                if let Err(e) = write.send(Message::Close(None)).await {
                    debug!("failed to send close frame: {e}");
                }
                return SessionEnd::Shutdown;
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => ingest(center, &text),
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => ingest(center, text),
                    Err(e) => warn!("dropping non-utf8 binary frame: {e}"),
                },
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| format!("closed by server ({}: {})", u16::from(f.code), f.reason))
                        .unwrap_or_else(|| "closed by server".to_string());
                    return SessionEnd::Disconnected(reason);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Disconnected(e.to_string()),
                None => return SessionEnd::Disconnected("stream ended".to_string()),
            }
        }
    }
}

fn ingest(center: &NotificationCenter, text: &str) {
    match decode_envelope(text) {
        Ok(envelope) => {
            let kind = envelope.kind.clone();
            let id = center.add_notification(envelope);
            debug!(%id, %kind, "notification received");
        }
        Err(e) => warn!("dropping malformed push event: {e}"),
    }
}

/// Resolves once shutdown was requested or the client handle is gone.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
