// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::{get, post};
use nsxbot_config::model::GatewayConfig;
use nsxbot_core::NsxbotError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::webhook::WebhookProcessor;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub processor: Arc<WebhookProcessor>,
    /// Process start time for uptime reporting.
    pub started: Instant,
}

impl GatewayState {
    pub fn new(processor: Arc<WebhookProcessor>) -> Self {
        Self {
            processor,
            started: Instant::now(),
        }
    }
}

/// Routes served by the gateway:
/// - POST /webhook (360dialog)
/// - POST /v1/chat
/// - GET /health
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/webhook", post(handlers::post_webhook))
        .route("/v1/chat", post(handlers::post_chat))
        .route("/health", get(handlers::get_health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds to the configured host:port and serves until the process stops.
pub async fn start_server(config: &GatewayConfig, state: GatewayState) -> Result<(), NsxbotError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| NsxbotError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, router(state))
        .await
        .map_err(|e| NsxbotError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })
}
