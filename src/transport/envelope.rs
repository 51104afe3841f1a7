//! Push event envelope and tolerant decoding.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::bus::EventKind;

/// JSON message pushed over the real-time connection.
///
/// Wire shape: `{ "type": TAG, "title": "...", "message": "...", "payload"?: {...} }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(
        default,
        deserialize_with = "object_payload",
        skip_serializing_if = "Option::is_none"
    )]
    pub payload: Option<serde_json::Value>,
}

impl EventEnvelope {
    pub fn new(kind: EventKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Fill in display fields the producer left blank.
    pub fn normalized(mut self) -> Self {
        if self.title.trim().is_empty() {
            self.title = self.kind.default_title().to_string();
        }
        self
    }
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("invalid json: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("envelope must be a json object, got {0}")]
    NotAnObject(&'static str),
    #[error("invalid envelope field: {0}")]
    InvalidField(#[source] serde_json::Error),
}

/// Decode one inbound frame into an envelope.
///
/// Missing `type` becomes `INFO`, unknown tags are preserved, and a missing
/// title is replaced with the kind's default title. Anything that is not a
/// JSON object, or has wrongly typed fields, is rejected.
pub fn decode_envelope(text: &str) -> Result<EventEnvelope, EnvelopeError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(EnvelopeError::InvalidJson)?;
    if !value.is_object() {
        return Err(EnvelopeError::NotAnObject(json_kind(&value)));
    }
    let envelope: EventEnvelope =
        serde_json::from_value(value).map_err(EnvelopeError::InvalidField)?;
    Ok(envelope.normalized())
}

/// `payload` is optional, but when present it must be an object.
fn object_payload<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None => Ok(None),
        Some(payload @ serde_json::Value::Object(_)) => Ok(Some(payload)),
        Some(other) => Err(D::Error::custom(format!(
            "payload must be a json object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
