//! Event system for real-time push delivery.
//!
//! The bus provides:
//! - The closed event taxonomy and its presentation mapping
//! - Publish-subscribe fan-out of envelopes to connected push clients
//!
//! # Architecture
//!
//! Events flow from producers → EventBus → WebSocket sessions → PushClient → NotificationStore:
//! - `EventBus`: In-memory broadcast channel, one receiver per connected socket
//! - `event_types`: `EventKind` tags and the icon/colour each one renders with

mod event_bus;
pub mod event_types;

pub use event_bus::{EventBus, PublishReceipt, PublishedEvent};
pub use event_types::{
    get_notification_bg_color, get_notification_icon, EventKind, Presentation,
    FALLBACK_PRESENTATION,
};
