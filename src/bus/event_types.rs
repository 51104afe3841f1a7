//! Event taxonomy and presentation mapping.
//!
//! Single source of truth for which event tags the farm pushes and how each
//! one is presented in the notification drawer. Unrecognized tags are kept
//! verbatim and always map to the fallback "info" presentation.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

pub const TAG_EMERGENCY_ALERT: &str = "EMERGENCY_ALERT";
pub const TAG_PRODUCTION_REPORT: &str = "PRODUCTION_REPORT";
pub const TAG_INVENTORY_ALERT: &str = "INVENTORY_ALERT";
pub const TAG_READY_FOR_SLAUGHTER: &str = "READY_FOR_SLAUGHTER";
pub const TAG_INFO: &str = "INFO";

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

/// Icon and background colour used to render a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Presentation {
    pub icon: &'static str,
    pub bg_color: &'static str,
}

const EMERGENCY: Presentation = Presentation {
    icon: "warning",
    bg_color: "#fdecea",
};
const PRODUCTION: Presentation = Presentation {
    icon: "assessment",
    bg_color: "#e8f5e9",
};
const INVENTORY: Presentation = Presentation {
    icon: "inventory",
    bg_color: "#fff4e5",
};
const SLAUGHTER: Presentation = Presentation {
    icon: "schedule",
    bg_color: "#e3f2fd",
};

/// Presentation for `INFO` and for every tag we do not recognize.
pub const FALLBACK_PRESENTATION: Presentation = Presentation {
    icon: "info",
    bg_color: "#f5f5f5",
};

// ---------------------------------------------------------------------------
// Event kind
// ---------------------------------------------------------------------------

/// Closed set of event kinds carried by push envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    EmergencyAlert,
    ProductionReport,
    InventoryAlert,
    ReadyForSlaughter,
    #[default]
    Info,
    /// A tag this build does not know about, preserved as received.
    Other(String),
}

impl EventKind {
    /// Parse a wire tag. Never fails: empty tags become `Info`, unknown tags
    /// become `Other`.
    pub fn from_tag(tag: &str) -> Self {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return EventKind::Info;
        }
        match trimmed.to_ascii_uppercase().as_str() {
            TAG_EMERGENCY_ALERT => EventKind::EmergencyAlert,
            TAG_PRODUCTION_REPORT => EventKind::ProductionReport,
            TAG_INVENTORY_ALERT => EventKind::InventoryAlert,
            TAG_READY_FOR_SLAUGHTER => EventKind::ReadyForSlaughter,
            TAG_INFO => EventKind::Info,
            _ => EventKind::Other(trimmed.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            EventKind::EmergencyAlert => TAG_EMERGENCY_ALERT,
            EventKind::ProductionReport => TAG_PRODUCTION_REPORT,
            EventKind::InventoryAlert => TAG_INVENTORY_ALERT,
            EventKind::ReadyForSlaughter => TAG_READY_FOR_SLAUGHTER,
            EventKind::Info => TAG_INFO,
            EventKind::Other(tag) => tag,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, EventKind::Other(_))
    }

    pub fn presentation(&self) -> &'static Presentation {
        match self {
            EventKind::EmergencyAlert => &EMERGENCY,
            EventKind::ProductionReport => &PRODUCTION,
            EventKind::InventoryAlert => &INVENTORY,
            EventKind::ReadyForSlaughter => &SLAUGHTER,
            EventKind::Info | EventKind::Other(_) => &FALLBACK_PRESENTATION,
        }
    }

    /// Title used when an envelope arrives without one.
    pub fn default_title(&self) -> &'static str {
        match self {
            EventKind::EmergencyAlert => "Emergency alert",
            EventKind::ProductionReport => "Production report",
            EventKind::InventoryAlert => "Inventory alert",
            EventKind::ReadyForSlaughter => "Batch ready for slaughter",
            EventKind::Info | EventKind::Other(_) => "Notification",
        }
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        EventKind::from_tag(&value)
    }
}

impl From<EventKind> for String {
    fn from(value: EventKind) -> Self {
        match value {
            EventKind::Other(tag) => tag,
            known => known.tag().to_string(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Icon for a raw tag, falling back to the info icon.
pub fn get_notification_icon(tag: &str) -> &'static str {
    EventKind::from_tag(tag).presentation().icon
}

/// Background colour for a raw tag, falling back to the info colour.
pub fn get_notification_bg_color(tag: &str) -> &'static str {
    EventKind::from_tag(tag).presentation().bg_color
}
