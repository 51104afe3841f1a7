use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::ServerState;
use crate::transport::EventEnvelope;

/// `{ success, data | message }` response envelope shared by the REST surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

pub(super) async fn publish_notification(
    State(state): State<ServerState>,
    body: Result<Json<EventEnvelope>, JsonRejection>,
) -> Response {
    let Json(envelope) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("rejected notification publish: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::error(rejection.body_text())),
            )
                .into_response();
        }
    };

    let envelope = envelope.normalized();
    let kind = envelope.kind.clone();
    let receipt = state.bus.publish(envelope);
    info!(seq = receipt.seq, %kind, receivers = receipt.receivers, "notification published");

    Json(ApiResponse::ok(receipt)).into_response()
}
