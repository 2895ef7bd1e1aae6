// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nsxbot serve` command implementation.
//!
//! Opens the memory store, wires the chat handler to the 360dialog client
//! and serves the gateway until SIGINT/SIGTERM. A background task purges
//! expired sessions every `memory.sweep_interval_secs`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use nsxbot_config::NsxbotConfig;
use nsxbot_core::{MemoryStore, NsxbotError};
use nsxbot_gateway::{
    ConfigSecretStore, Dialog360Client, GatewayState, WebhookProcessor, start_server,
};
use tracing::{debug, info, warn};

use crate::wiring::build_handler;

pub async fn run_serve(config: NsxbotConfig) -> Result<(), NsxbotError> {
    let config = Arc::new(config);
    info!(
        host = %config.gateway.host,
        port = config.gateway.port,
        backend = %config.memory.backend,
        "starting nsxbot serve"
    );

    let storage = nsxbot_storage::open_storage(&config.memory).await?;
    let sessions = storage.memory.clone();
    let handler = Arc::new(build_handler(config.clone(), &storage)?);

    let secrets = Arc::new(ConfigSecretStore::new(&config.secrets));
    let messenger = Arc::new(Dialog360Client::new(&config.gateway, secrets)?);
    let processor = Arc::new(WebhookProcessor::new(
        handler,
        messenger,
        sessions.clone(),
        config.clone(),
    ));

    let sweeper = tokio::spawn(sweep_periodically(
        sessions,
        Duration::from_secs(config.memory.sweep_interval_secs.max(1)),
    ));

    let result = tokio::select! {
        served = start_server(&config.gateway, GatewayState::new(processor)) => served,
        () = shutdown_signal() => Ok(()),
    };
    sweeper.abort();
    info!("nsxbot stopped");
    result
}

async fn sweep_periodically(sessions: Arc<dyn MemoryStore>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match sessions.purge_expired(Utc::now()).await {
            Ok(0) => debug!("no expired sessions"),
            Ok(purged) => info!(purged, "expired sessions purged"),
            Err(e) => warn!(code = e.code(), error = %e, "session sweep failed"),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT (Ctrl+C), shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
