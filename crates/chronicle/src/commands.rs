// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations. Each writes its report to the given writer so
//! the output can be checked in tests.

use std::io::Write;

use chronicle_config::model::ChronicleConfig;
use chronicle_core::{
    ChronicleError, LoadOptions, MetadataFilter, PluginAdapter, SessionStore, VectorStore,
};
use chronicle_memory::SqliteVectorStore;
use chronicle_memory::types::keys;
use chronicle_storage::queries::messages::load_stored;
use chronicle_storage::{Database, SqliteSessionStore};
use serde::Serialize;
use tracing::info;

/// Output style shared by the read commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormat {
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct HistoryLine {
    sequence: i64,
    id: String,
    role: String,
    checkpoint: bool,
    created_at: String,
    text: String,
}

fn io_err(e: std::io::Error) -> ChronicleError {
    ChronicleError::Internal(format!("failed to write output: {e}"))
}

fn json_err(e: serde_json::Error) -> ChronicleError {
    ChronicleError::Internal(format!("failed to encode output: {e}"))
}

/// `chronicle history`: stored messages for a session, oldest first.
///
/// `since_checkpoint` restricts the listing to what a checkpoint-aware
/// reload would read: the newest checkpoint and everything after it.
pub async fn run_history(
    db: &Database,
    agent_id: &str,
    session_id: &str,
    limit: Option<usize>,
    since_checkpoint: bool,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<(), ChronicleError> {
    let mut options = LoadOptions {
        limit,
        ..LoadOptions::default()
    };
    if since_checkpoint {
        let store = SqliteSessionStore::with_database(db.clone());
        if let Some(checkpoint) = store.last_checkpoint(agent_id, session_id).await? {
            options.after_message_id = Some(
                checkpoint
                    .resume_after()
                    .map_or_else(|| checkpoint.id.clone(), str::to_string),
            );
        }
    }

    let stored = load_stored(db, agent_id, session_id, &options).await?;
    let lines: Vec<HistoryLine> = stored
        .into_iter()
        .map(|s| HistoryLine {
            sequence: s.sequence_num,
            checkpoint: s.message.is_checkpoint(),
            text: s.message.text(),
            id: s.message.id,
            role: s.message.role.to_string(),
            created_at: s.message.created_at,
        })
        .collect();

    if format.json {
        let encoded = serde_json::to_string_pretty(&lines).map_err(json_err)?;
        writeln!(out, "{encoded}").map_err(io_err)?;
        return Ok(());
    }
    if lines.is_empty() {
        writeln!(out, "no messages in session {session_id}").map_err(io_err)?;
        return Ok(());
    }
    for line in &lines {
        let marker = if line.checkpoint { " [checkpoint]" } else { "" };
        writeln!(
            out,
            "#{:<5} {:<6}{} {}",
            line.sequence, line.role, marker, line.text
        )
        .map_err(io_err)?;
    }
    Ok(())
}

/// `chronicle count`: number of stored messages in a session.
pub async fn run_count(
    store: &SqliteSessionStore,
    agent_id: &str,
    session_id: &str,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<(), ChronicleError> {
    let count = store.count_messages(agent_id, session_id).await?;
    if format.json {
        let encoded = serde_json::json!({ "session_id": session_id, "messages": count });
        writeln!(out, "{encoded}").map_err(io_err)?;
    } else {
        writeln!(out, "{count}").map_err(io_err)?;
    }
    Ok(())
}

/// `chronicle sessions`: every session of the agent, most recently updated first.
pub async fn run_sessions(
    store: &SqliteSessionStore,
    agent_id: &str,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<(), ChronicleError> {
    let sessions = store.list_sessions(agent_id).await?;
    if format.json {
        let encoded = serde_json::to_string_pretty(&sessions).map_err(json_err)?;
        writeln!(out, "{encoded}").map_err(io_err)?;
        return Ok(());
    }
    if sessions.is_empty() {
        writeln!(out, "no sessions for agent {agent_id}").map_err(io_err)?;
    }
    for session in &sessions {
        let count = store.count_messages(agent_id, &session.session_id).await?;
        writeln!(
            out,
            "{}  {} messages  updated {}",
            session.session_id, count, session.updated_at
        )
        .map_err(io_err)?;
    }
    Ok(())
}

/// `chronicle clear`: deletes a session and, unless `keep_long_term`,
/// its entries in the SQLite vector collection.
pub async fn run_clear(
    db: &Database,
    config: &ChronicleConfig,
    session_id: &str,
    keep_long_term: bool,
    out: &mut impl Write,
) -> Result<(), ChronicleError> {
    let agent_id = config.agent.id.as_str();
    let store = SqliteSessionStore::with_database(db.clone());
    let removed = store.count_messages(agent_id, session_id).await?;
    store.delete_session(agent_id, session_id).await?;

    let mut vectors = 0;
    if !keep_long_term {
        let filter = MetadataFilter::from([
            (keys::AGENT_ID.to_string(), agent_id.to_string()),
            (keys::SESSION_ID.to_string(), session_id.to_string()),
        ]);
        vectors = SqliteVectorStore::new(db.clone())
            .delete_by_filter(&config.long_term.collection, &filter)
            .await?;
    }
    info!(session_id, removed, vectors, "session cleared");
    writeln!(
        out,
        "cleared session {session_id}: {removed} messages, {vectors} long-term entries"
    )
    .map_err(io_err)
}

/// `chronicle check-config`: prints the effective configuration and probes
/// the database.
pub async fn run_check_config(
    config: &ChronicleConfig,
    out: &mut impl Write,
) -> Result<(), ChronicleError> {
    let rendered = serde_json::to_string_pretty(config).map_err(json_err)?;
    writeln!(out, "{rendered}").map_err(io_err)?;

    let db = Database::open_config(&config.storage).await?;
    let store = SqliteSessionStore::with_database(db.clone());
    let status = store.health_check().await?;
    writeln!(
        out,
        "database {} is reachable ({status:?})",
        config.storage.database_path
    )
    .map_err(io_err)?;
    db.close().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::{CancellationToken, Message, VectorDocument};
    use serde_json::json;

    async fn setup() -> (tempfile::TempDir, ChronicleConfig, Database) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ChronicleConfig::default();
        config.storage.database_path = dir.path().join("cli.db").to_string_lossy().into_owned();
        let db = Database::open_config(&config.storage).await.unwrap();
        (dir, config, db)
    }

    async fn seed(db: &Database, agent: &str, session: &str, texts: &[&str]) {
        let store = SqliteSessionStore::with_database(db.clone());
        let messages: Vec<Message> = texts.iter().map(|t| Message::user(*t)).collect();
        store
            .append_messages(agent, session, &messages, &CancellationToken::new())
            .await
            .unwrap();
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn history_lists_messages_in_order() {
        let (_dir, config, db) = setup().await;
        seed(&db, &config.agent.id, "s1", &["first", "second", "third"]).await;

        let mut buf = Vec::new();
        run_history(&db, &config.agent.id, "s1", Some(2), false, OutputFormat::default(), &mut buf)
            .await
            .unwrap();
        let text = output(buf);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("second"));
        assert!(lines[1].starts_with("#3"));
    }

    #[tokio::test]
    async fn history_since_checkpoint_skips_compacted_messages() {
        let (_dir, config, db) = setup().await;
        let agent = config.agent.id.clone();
        seed(&db, &agent, "s1", &["old one", "old two"]).await;
        let store = SqliteSessionStore::with_database(db.clone());
        let loaded = store
            .load_messages(&agent, "s1", &LoadOptions::default())
            .await
            .unwrap();
        let checkpoint = Message::new(chronicle_core::Role::System, "summary")
            .with_metadata("checkpoint", json!(true))
            .with_metadata("resume_after", json!(loaded[1].id.clone()));
        store
            .append_messages(&agent, "s1", &[checkpoint], &CancellationToken::new())
            .await
            .unwrap();
        seed(&db, &agent, "s1", &["fresh"]).await;

        let mut buf = Vec::new();
        let format = OutputFormat { json: true };
        run_history(&db, &agent, "s1", None, true, format, &mut buf).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output(buf)).unwrap();
        let texts: Vec<&str> = parsed
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["text"].as_str().unwrap())
            .collect();
        assert_eq!(texts, vec!["summary", "fresh"]);
        assert_eq!(parsed[0]["checkpoint"], json!(true));
    }

    #[tokio::test]
    async fn count_and_sessions_report_per_agent() {
        let (_dir, config, db) = setup().await;
        seed(&db, &config.agent.id, "s1", &["a", "b"]).await;
        seed(&db, "someone-else", "s2", &["c"]).await;
        let store = SqliteSessionStore::with_database(db.clone());

        let mut buf = Vec::new();
        run_count(&store, &config.agent.id, "s1", OutputFormat::default(), &mut buf)
            .await
            .unwrap();
        assert_eq!(output(buf).trim(), "2");

        let mut buf = Vec::new();
        run_sessions(&store, &config.agent.id, OutputFormat::default(), &mut buf)
            .await
            .unwrap();
        let text = output(buf);
        assert!(text.contains("s1  2 messages"));
        assert!(!text.contains("s2"));
    }

    #[tokio::test]
    async fn clear_removes_messages_and_vectors() {
        let (_dir, config, db) = setup().await;
        let agent = config.agent.id.clone();
        seed(&db, &agent, "s1", &["a", "b", "c"]).await;

        let vectors = SqliteVectorStore::new(db.clone());
        let mut metadata = serde_json::Map::new();
        metadata.insert("agent_id".into(), json!(agent));
        metadata.insert("session_id".into(), json!("s1"));
        vectors
            .upsert(
                &config.long_term.collection,
                VectorDocument {
                    id: "doc".into(),
                    vector: vec![1.0, 0.0],
                    metadata,
                },
            )
            .await
            .unwrap();

        let mut buf = Vec::new();
        run_clear(&db, &config, "s1", false, &mut buf).await.unwrap();
        assert_eq!(
            output(buf).trim(),
            "cleared session s1: 3 messages, 1 long-term entries"
        );
        assert_eq!(vectors.count(&config.long_term.collection).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn check_config_probes_database() {
        let (_dir, config, db) = setup().await;
        db.close().await.unwrap();

        let mut buf = Vec::new();
        run_check_config(&config, &mut buf).await.unwrap();
        let text = output(buf);
        assert!(text.contains("\"working_memory\""));
        assert!(text.contains("is reachable (Healthy)"));
    }
}
