// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed memory store and interaction log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use nsxbot_config::model::MemoryConfig;
use nsxbot_core::types::{ConversationTurn, InteractionRecord, UserKey, UserSession};
use nsxbot_core::{
    AdapterType, HealthStatus, InteractionLog, MemoryStore, NsxbotError, PluginAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// Persistent memory store. Survives restarts; expired sessions are hidden
/// from reads and physically removed by [`MemoryStore::purge_expired`].
pub struct SqliteStore {
    db: Database,
    ttl: chrono::Duration,
}

impl SqliteStore {
    /// Opens the database configured in `[memory]`.
    pub async fn open(config: &MemoryConfig) -> Result<Self, NsxbotError> {
        let db = Database::open(&config.database_path).await?;
        debug!(path = %config.database_path, "SQLite memory store initialized");
        Ok(Self::with_database(db, config.expiration_secs))
    }

    pub fn with_database(db: Database, expiration_secs: u64) -> Self {
        Self {
            db,
            ttl: chrono::Duration::seconds(expiration_secs as i64),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.ttl
    }

    async fn is_live(&self, key: &UserKey) -> Result<bool, NsxbotError> {
        Ok(queries::sessions::get_live(&self.db, key, self.cutoff(Utc::now()))
            .await?
            .is_some())
    }

    async fn write(
        &self,
        key: &UserKey,
        index: &str,
        turns: Vec<ConversationTurn>,
        replace: bool,
    ) -> Result<(), NsxbotError> {
        let now = Utc::now();
        queries::turns::write(&self.db, key, index, turns, replace, now, self.cutoff(now)).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Memory
    }

    async fn health_check(&self) -> Result<HealthStatus, NsxbotError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), NsxbotError> {
        self.db.checkpoint().await?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for SqliteStore {
    async fn history(
        &self,
        key: &UserKey,
        index: &str,
    ) -> Result<Vec<ConversationTurn>, NsxbotError> {
        if !self.is_live(key).await? {
            return Ok(Vec::new());
        }
        queries::turns::list(&self.db, key, index).await
    }

    async fn append(
        &self,
        key: &UserKey,
        index: &str,
        turns: Vec<ConversationTurn>,
    ) -> Result<(), NsxbotError> {
        self.write(key, index, turns, false).await
    }

    async fn replace(
        &self,
        key: &UserKey,
        index: &str,
        turns: Vec<ConversationTurn>,
    ) -> Result<(), NsxbotError> {
        self.write(key, index, turns, true).await
    }

    async fn clear(&self, key: &UserKey, index: &str) -> Result<(), NsxbotError> {
        queries::turns::clear(&self.db, key, index).await
    }

    async fn set_active_index(&self, key: &UserKey, index: &str) -> Result<(), NsxbotError> {
        let now = Utc::now();
        queries::sessions::set_active_index(&self.db, key, index, now, self.cutoff(now)).await
    }

    async fn active_index(&self, key: &UserKey) -> Result<Option<String>, NsxbotError> {
        Ok(
            queries::sessions::get_live(&self.db, key, self.cutoff(Utc::now()))
                .await?
                .and_then(|row| row.active_index),
        )
    }

    async fn session(&self, key: &UserKey) -> Result<Option<UserSession>, NsxbotError> {
        let Some(row) =
            queries::sessions::get_live(&self.db, key, self.cutoff(Utc::now())).await?
        else {
            return Ok(None);
        };
        Ok(Some(UserSession {
            key: key.clone(),
            active_index: row.active_index,
            last_interaction: row.last_interaction,
            histories: queries::turns::list_all(&self.db, key).await?,
        }))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, NsxbotError> {
        let purged = queries::sessions::purge_before(&self.db, self.cutoff(now)).await?;
        debug!(purged, "expired sessions purged");
        Ok(purged)
    }
}

/// Interaction log writing to the `interactions` table.
#[derive(Clone)]
pub struct SqliteInteractionLog {
    db: Database,
}

impl SqliteInteractionLog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn recent(
        &self,
        key: &UserKey,
        limit: usize,
    ) -> Result<Vec<InteractionRecord>, NsxbotError> {
        queries::interactions::recent_for_user(&self.db, key, limit).await
    }
}

#[async_trait]
impl InteractionLog for SqliteInteractionLog {
    async fn record(&self, record: &InteractionRecord) -> Result<(), NsxbotError> {
        queries::interactions::insert(&self.db, record).await
    }
}
