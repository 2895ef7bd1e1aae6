// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Handles POST /webhook, POST /v1/chat and GET /health.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use nsxbot_core::types::UserKey;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::payload::{ChannelHeaders, WebhookEvent};
use crate::server::GatewayState;

/// Chatbot id recorded for users of the chat API.
pub const API_CHATBOT_ID: &str = "api";

/// Acknowledgement returned to 360dialog.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ack {
    pub message: String,
}

/// Request body for POST /v1/chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    #[serde(default)]
    pub index: Option<String>,
}

/// Response body for POST /v1/chat.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

fn error_response(status: StatusCode, error: impl Into<String>, code: Option<&str>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.map(str::to_string),
        }),
    )
        .into_response()
}

/// POST /webhook
///
/// Acknowledges immediately and processes the message in a background task.
/// Delivery statuses are acknowledged and dropped.
pub async fn post_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(event): Json<WebhookEvent>,
) -> Response {
    let ack = Json(Ack {
        message: "OK".to_string(),
    });
    let Some(inbound) = event.inbound() else {
        debug!("webhook without messages acknowledged");
        return ack.into_response();
    };
    let Some(channel) = ChannelHeaders::from_headers(&headers, state.processor.handler().config())
    else {
        warn!("webhook call without nm-number header");
        return error_response(StatusCode::BAD_REQUEST, "missing nm-number header", None);
    };

    let processor = state.processor.clone();
    tokio::spawn(async move {
        processor.process(&channel, inbound).await;
    });
    ack.into_response()
}

/// POST /v1/chat?index=...
///
/// Answers synchronously. The index defaults to `nsx.default_index`.
pub async fn post_chat(
    State(state): State<GatewayState>,
    Query(query): Query<ChatQuery>,
    Json(body): Json<ChatRequest>,
) -> Response {
    if body.user.trim().is_empty() || body.message.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "`user` and `message` must not be empty",
            None,
        );
    }
    let handler = state.processor.handler();
    let index = query
        .index
        .filter(|i| !i.trim().is_empty())
        .unwrap_or_else(|| handler.config().nsx.default_index.clone());
    let user = UserKey::new(body.user, API_CHATBOT_ID);

    match handler.respond(&body.message, &user, &index).await {
        Ok(reply) => Json(ChatResponse { answer: reply.text }).into_response(),
        Err(e) => {
            let code = e.code();
            warn!(user_id = %user.user_id, %index, code, error = %e, "chat request failed");
            let message = handler.config().gateway.error_message.replace("{code}", code);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, message, Some(code))
        }
    }
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started.elapsed().as_secs(),
    })
}
