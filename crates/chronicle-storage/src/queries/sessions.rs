// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session CRUD operations. Every statement is keyed by `(id, agent_id)`.

use chronicle_core::{ChronicleError, SessionMetadata};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};

const SELECT_SESSION: &str =
    "SELECT id, agent_id, metadata, created_at, updated_at FROM sessions";

fn row_to_session(row: &Row<'_>) -> Result<SessionMetadata, rusqlite::Error> {
    let raw: String = row.get(2)?;
    let metadata = serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(SessionMetadata {
        session_id: row.get(0)?,
        agent_id: row.get(1)?,
        metadata,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Inserts the session row if missing. Shared by `ensure_session` and the
/// append transaction.
pub(crate) fn insert_if_missing(
    conn: &rusqlite::Connection,
    agent_id: &str,
    session_id: &str,
    now: &str,
) -> Result<usize, rusqlite::Error> {
    conn.execute(
        "INSERT OR IGNORE INTO sessions (id, agent_id, metadata, created_at, updated_at)
         VALUES (?1, ?2, '{}', ?3, ?3)",
        params![session_id, agent_id, now],
    )
}

/// Get-or-create. An existing session is returned unchanged.
pub async fn ensure_session(
    db: &Database,
    agent_id: &str,
    session_id: &str,
) -> Result<SessionMetadata, ChronicleError> {
    let agent_id = agent_id.to_string();
    let session_id = session_id.to_string();
    let now = chrono::Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| -> Result<SessionMetadata, rusqlite::Error> {
            insert_if_missing(conn, &agent_id, &session_id, &now)?;
            conn.query_row(
                &format!("{SELECT_SESSION} WHERE id = ?1 AND agent_id = ?2"),
                params![session_id, agent_id],
                row_to_session,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_session(
    db: &Database,
    agent_id: &str,
    session_id: &str,
) -> Result<Option<SessionMetadata>, ChronicleError> {
    let agent_id = agent_id.to_string();
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("{SELECT_SESSION} WHERE id = ?1 AND agent_id = ?2"),
                params![session_id, agent_id],
                row_to_session,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Sessions of one agent, most recently updated first.
pub async fn list_sessions(
    db: &Database,
    agent_id: &str,
) -> Result<Vec<SessionMetadata>, ChronicleError> {
    let agent_id = agent_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<SessionMetadata>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_SESSION} WHERE agent_id = ?1 ORDER BY updated_at DESC, id ASC"
            ))?;
            let rows = stmt.query_map(params![agent_id], row_to_session)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes a session; its messages go with it via `ON DELETE CASCADE`.
/// Returns whether a session existed.
pub async fn delete_session(
    db: &Database,
    agent_id: &str,
    session_id: &str,
) -> Result<bool, ChronicleError> {
    let agent_id = agent_id.to_string();
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let deleted = conn.execute(
                "DELETE FROM sessions WHERE id = ?1 AND agent_id = ?2",
                params![session_id, agent_id],
            )?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_session_is_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        let first = ensure_session(&db, "agent-a", "s1").await.unwrap();
        let second = ensure_session(&db, "agent-a", "s1").await.unwrap();
        assert_eq!(first, second);
        assert!(first.metadata.is_empty());
        assert_eq!(first.created_at, first.updated_at);
    }

    #[tokio::test]
    async fn same_session_id_is_distinct_per_agent() {
        let db = Database::open_in_memory().await.unwrap();
        ensure_session(&db, "agent-a", "s1").await.unwrap();
        ensure_session(&db, "agent-b", "s1").await.unwrap();

        assert_eq!(list_sessions(&db, "agent-a").await.unwrap().len(), 1);
        assert!(delete_session(&db, "agent-a", "s1").await.unwrap());
        assert!(get_session(&db, "agent-a", "s1").await.unwrap().is_none());
        assert!(get_session(&db, "agent-b", "s1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_missing_session_reports_false() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(!delete_session(&db, "agent-a", "nope").await.unwrap());
    }
}
