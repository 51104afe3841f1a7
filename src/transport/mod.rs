//! Real-time delivery of push events.
//!
//! - `envelope`: the JSON wire shape and tolerant decoding
//! - `client`: the WebSocket client that feeds a `NotificationCenter`

pub mod client;
pub mod envelope;

pub use client::{ClientConfig, ConnectionState, PushClient, ReconnectPolicy};
pub use envelope::{decode_envelope, EnvelopeError, EventEnvelope};
