// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation memory for nsxbot.
//!
//! Two [`MemoryStore`](nsxbot_core::MemoryStore) backends: a `DashMap`
//! store for development and evaluation, and a WAL-mode SQLite store with
//! embedded migrations for production. The SQLite database also holds the
//! interaction audit log.

pub mod database;
pub mod memory;
pub mod migrations;
pub mod queries;
pub mod sqlite;

use std::sync::Arc;
use std::time::Duration;

use nsxbot_config::model::{MemoryBackend, MemoryConfig};
use nsxbot_core::{InteractionLog, MemoryStore, NsxbotError};

pub use database::Database;
pub use memory::InMemoryStore;
pub use sqlite::{SqliteInteractionLog, SqliteStore};

/// Memory store plus the audit log that shares its backend, if any.
pub struct Storage {
    pub memory: Arc<dyn MemoryStore>,
    pub audit: Option<Arc<dyn InteractionLog>>,
}

/// Builds the backend selected by `[memory] backend`.
pub async fn open_storage(config: &MemoryConfig) -> Result<Storage, NsxbotError> {
    match config.backend {
        MemoryBackend::Memory => Ok(Storage {
            memory: Arc::new(InMemoryStore::new(Duration::from_secs(
                config.expiration_secs,
            ))),
            audit: None,
        }),
        MemoryBackend::Sqlite => {
            let store = SqliteStore::open(config).await?;
            let audit = SqliteInteractionLog::new(store.database().clone());
            Ok(Storage {
                memory: Arc::new(store),
                audit: Some(Arc::new(audit)),
            })
        }
    }
}
