// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nsxbot sweep`: one-shot purge of expired sessions.

use chrono::Utc;
use nsxbot_config::NsxbotConfig;
use nsxbot_config::model::MemoryBackend;
use nsxbot_core::{MemoryStore, NsxbotError};
use nsxbot_storage::SqliteStore;

pub async fn run_sweep(config: NsxbotConfig) -> Result<(), NsxbotError> {
    if config.memory.backend != MemoryBackend::Sqlite {
        return Err(NsxbotError::Config(
            "sweep needs memory.backend = \"sqlite\"; in-memory sessions expire with the process"
                .into(),
        ));
    }
    let store = SqliteStore::open(&config.memory).await?;
    let purged = store.purge_expired(Utc::now()).await?;
    println!(
        "purged {purged} expired session(s) from {}",
        config.memory.database_path
    );
    Ok(())
}
