// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the SQLite memory store and audit log.

use std::collections::BTreeMap;

use chrono::Utc;
use nsxbot_config::model::{MemoryBackend, MemoryConfig};
use nsxbot_core::types::{ConversationTurn, InteractionRecord, Role, UserKey};
use nsxbot_core::{InteractionLog, MemoryStore, PluginAdapter};
use nsxbot_storage::{Database, SqliteInteractionLog, SqliteStore, open_storage};

fn key() -> UserKey {
    UserKey::new("5531988887777", "5531999990000")
}

async fn store(ttl: u64) -> SqliteStore {
    SqliteStore::with_database(Database::open_in_memory().await.unwrap(), ttl)
}

#[tokio::test]
async fn history_round_trips_in_order() {
    let store = store(3600).await;
    store
        .append(
            &key(),
            "FUNDEP_Ciencias",
            vec![
                ConversationTurn::user("Qual a data da prova?"),
                ConversationTurn::assistant("A prova será dia 25/03."),
            ],
        )
        .await
        .unwrap();
    store
        .append(&key(), "FUNDEP_Ciencias", vec![ConversationTurn::user("Obrigado")])
        .await
        .unwrap();

    let turns = store.history(&key(), "FUNDEP_Ciencias").await.unwrap();
    let roles: Vec<Role> = turns.iter().map(|t| t.role).collect();
    assert_eq!(roles, [Role::User, Role::Assistant, Role::User]);
    assert_eq!(turns[2].content, "Obrigado");
    assert!(store.history(&key(), "Outro").await.unwrap().is_empty());
}

#[tokio::test]
async fn replace_swaps_whole_history() {
    let store = store(3600).await;
    store
        .append(&key(), "A", vec![ConversationTurn::user("1"), ConversationTurn::assistant("2")])
        .await
        .unwrap();
    store
        .replace(&key(), "A", vec![ConversationTurn::system("Resumo de conversas anteriores: x")])
        .await
        .unwrap();
    let turns = store.history(&key(), "A").await.unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, Role::System);
}

#[tokio::test]
async fn active_index_and_session_snapshot() {
    let store = store(3600).await;
    assert!(store.session(&key()).await.unwrap().is_none());

    store.set_active_index(&key(), "A").await.unwrap();
    store
        .append(&key(), "A", vec![ConversationTurn::user("oi")])
        .await
        .unwrap();
    store.set_active_index(&key(), "B").await.unwrap();

    let session = store.session(&key()).await.unwrap().expect("live session");
    assert_eq!(session.active_index.as_deref(), Some("B"));
    assert_eq!(session.histories["A"].len(), 1);
    assert_eq!(store.active_index(&key()).await.unwrap().as_deref(), Some("B"));
}

#[tokio::test]
async fn purge_removes_idle_sessions_and_turns() {
    let store = store(60).await;
    store
        .append(&key(), "A", vec![ConversationTurn::user("oi")])
        .await
        .unwrap();

    assert_eq!(store.purge_expired(Utc::now()).await.unwrap(), 0);
    let later = Utc::now() + chrono::Duration::seconds(120);
    assert_eq!(store.purge_expired(later).await.unwrap(), 1);
    assert!(store.history(&key(), "A").await.unwrap().is_empty());
}

#[tokio::test]
async fn expired_session_is_hidden_and_restarted_on_write() {
    let store = store(1).await;
    store.set_active_index(&key(), "A").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2100)).await;
    assert_eq!(store.active_index(&key()).await.unwrap(), None);

    // Writing after expiry starts a fresh session without the old index.
    store
        .append(&key(), "A", vec![ConversationTurn::user("novo")])
        .await
        .unwrap();
    let session = store.session(&key()).await.unwrap().expect("fresh session");
    assert_eq!(session.active_index, None);
}

#[tokio::test]
async fn interaction_log_persists_records() {
    let db = Database::open_in_memory().await.unwrap();
    let log = SqliteInteractionLog::new(db);
    let mut latency = BTreeMap::new();
    latency.insert("total".to_string(), 1.25);
    let record = InteractionRecord {
        timestamp: Utc::now(),
        user: key(),
        index: "A".into(),
        user_message: "Qual a data da prova?".into(),
        answer: "25/03".into(),
        reasoning: "Thought 1: ...".into(),
        outcome: "done".into(),
        latency,
    };
    log.record(&record).await.unwrap();

    let recent = log.recent(&key(), 10).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].answer, "25/03");
    assert_eq!(recent[0].latency["total"], 1.25);
}

#[tokio::test]
async fn open_storage_selects_backend() {
    let dir = tempfile::tempdir().unwrap();
    let config = MemoryConfig {
        backend: MemoryBackend::Sqlite,
        database_path: dir.path().join("nsxbot.db").display().to_string(),
        ..MemoryConfig::default()
    };
    let storage = open_storage(&config).await.unwrap();
    assert_eq!(storage.memory.name(), "sqlite");
    assert!(storage.audit.is_some());

    let config = MemoryConfig {
        backend: MemoryBackend::Memory,
        ..MemoryConfig::default()
    };
    let storage = open_storage(&config).await.unwrap();
    assert_eq!(storage.memory.name(), "memory");
    assert!(storage.audit.is_none());
}
