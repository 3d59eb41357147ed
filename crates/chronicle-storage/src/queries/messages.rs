// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message log operations.
//!
//! Sequence numbers are the only ordering authority. They are allocated
//! inside the same `BEGIN IMMEDIATE` transaction as the inserts, so
//! concurrent writers (including other processes) never interleave.

use chronicle_core::{CancellationToken, ChronicleError, LoadOptions, Message};
use rusqlite::types::{Type, Value};
use rusqlite::{OptionalExtension, TransactionBehavior, params, params_from_iter};

use crate::database::{Database, map_tr_err};
use crate::models::{AppendOutcome, StoredMessage};
use crate::queries::sessions::insert_if_missing;

/// A message serialized for insertion.
struct EncodedMessage {
    message_id: String,
    context_id: Option<String>,
    task_id: Option<String>,
    role: String,
    payload: String,
    is_checkpoint: bool,
    created_at: String,
}

impl EncodedMessage {
    fn encode(message: &Message) -> Result<Self, ChronicleError> {
        Ok(Self {
            message_id: message.id.clone(),
            context_id: message.context_id.clone(),
            task_id: message.task_id.clone(),
            role: message.role.to_string(),
            payload: serde_json::to_string(message).map_err(ChronicleError::storage)?,
            is_checkpoint: message.is_checkpoint(),
            created_at: message.created_at.clone(),
        })
    }
}

fn decode_payload(raw: &str, column: usize) -> Result<Message, rusqlite::Error> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

/// Appends messages atomically, creating the session row on first write.
///
/// The token is checked again right before commit; if it fired, the
/// transaction is rolled back and [`AppendOutcome::RolledBack`] returned.
pub async fn append_messages(
    db: &Database,
    agent_id: &str,
    session_id: &str,
    messages: &[Message],
    cancel: &CancellationToken,
) -> Result<AppendOutcome, ChronicleError> {
    let encoded = messages
        .iter()
        .map(EncodedMessage::encode)
        .collect::<Result<Vec<_>, _>>()?;
    let agent_id = agent_id.to_string();
    let session_id = session_id.to_string();
    let cancel = cancel.clone();
    let now = chrono::Utc::now().to_rfc3339();

    db.connection()
        .call(move |conn| -> Result<AppendOutcome, rusqlite::Error> {
            if cancel.is_cancelled() {
                return Ok(AppendOutcome::RolledBack);
            }
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            insert_if_missing(&tx, &agent_id, &session_id, &now)?;

            let last: i64 = tx.query_row(
                "SELECT COALESCE(MAX(sequence_num), 0) FROM session_messages
                 WHERE agent_id = ?1 AND session_id = ?2",
                params![agent_id, session_id],
                |row| row.get(0),
            )?;

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO session_messages
                     (session_id, agent_id, message_id, context_id, task_id, role,
                      message_payload, is_checkpoint, sequence_num, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                )?;
                for (offset, msg) in encoded.iter().enumerate() {
                    stmt.execute(params![
                        session_id,
                        agent_id,
                        msg.message_id,
                        msg.context_id,
                        msg.task_id,
                        msg.role,
                        msg.payload,
                        msg.is_checkpoint,
                        last + offset as i64 + 1,
                        msg.created_at,
                    ])?;
                }
            }

            tx.execute(
                "UPDATE sessions SET updated_at = ?3 WHERE id = ?1 AND agent_id = ?2",
                params![session_id, agent_id, now],
            )?;

            if cancel.is_cancelled() {
                tx.rollback()?;
                return Ok(AppendOutcome::RolledBack);
            }
            tx.commit()?;
            Ok(AppendOutcome::Committed {
                first: last + 1,
                last: last + encoded.len() as i64,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Builds the filtered history query. `?1` is the agent, `?2` the session.
fn build_load_query(options: &LoadOptions) -> (String, Vec<Value>) {
    let mut sql = String::from(
        "SELECT sequence_num, message_payload FROM session_messages
         WHERE agent_id = ?1 AND session_id = ?2",
    );
    let mut args: Vec<Value> = Vec::new();
    let mut next_param = 3;

    if let Some(after) = &options.after_message_id {
        // An unknown id matches nothing, so the whole log is returned.
        sql.push_str(&format!(
            " AND sequence_num > COALESCE((SELECT MAX(sequence_num) FROM session_messages
               WHERE agent_id = ?1 AND session_id = ?2 AND message_id = ?{next_param}), 0)"
        ));
        args.push(Value::Text(after.clone()));
        next_param += 1;
    }

    if !options.roles.is_empty() {
        let placeholders: Vec<String> = options
            .roles
            .iter()
            .map(|role| {
                args.push(Value::Text(role.to_string()));
                let p = format!("?{next_param}");
                next_param += 1;
                p
            })
            .collect();
        sql.push_str(&format!(" AND role IN ({})", placeholders.join(", ")));
    }

    if options.skip_checkpoints {
        sql.push_str(" AND is_checkpoint = 0");
    }

    match options.limit {
        Some(limit) => {
            args.push(Value::Integer(limit as i64));
            sql = format!(
                "SELECT sequence_num, message_payload FROM ({sql}
                 ORDER BY sequence_num DESC LIMIT ?{next_param})
                 ORDER BY sequence_num ASC"
            );
        }
        None => sql.push_str(" ORDER BY sequence_num ASC"),
    }

    (sql, args)
}

/// Loads messages with their sequence numbers, oldest first.
pub async fn load_stored(
    db: &Database,
    agent_id: &str,
    session_id: &str,
    options: &LoadOptions,
) -> Result<Vec<StoredMessage>, ChronicleError> {
    let (sql, extra) = build_load_query(options);
    let mut args = vec![
        Value::Text(agent_id.to_string()),
        Value::Text(session_id.to_string()),
    ];
    args.extend(extra);

    db.connection()
        .call(move |conn| -> Result<Vec<StoredMessage>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args), |row| {
                let raw: String = row.get(1)?;
                Ok(StoredMessage {
                    sequence_num: row.get(0)?,
                    message: decode_payload(&raw, 1)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Loads messages oldest first.
pub async fn load_messages(
    db: &Database,
    agent_id: &str,
    session_id: &str,
    options: &LoadOptions,
) -> Result<Vec<Message>, ChronicleError> {
    Ok(load_stored(db, agent_id, session_id, options)
        .await?
        .into_iter()
        .map(|stored| stored.message)
        .collect())
}

/// The newest checkpoint of a session.
pub async fn last_checkpoint(
    db: &Database,
    agent_id: &str,
    session_id: &str,
) -> Result<Option<Message>, ChronicleError> {
    let agent_id = agent_id.to_string();
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Message>, rusqlite::Error> {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT message_payload FROM session_messages
                     WHERE agent_id = ?1 AND session_id = ?2 AND is_checkpoint = 1
                     ORDER BY sequence_num DESC LIMIT 1",
                    params![agent_id, session_id],
                    |row| row.get(0),
                )
                .optional()?;
            raw.map(|raw| decode_payload(&raw, 0)).transpose()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_messages(
    db: &Database,
    agent_id: &str,
    session_id: &str,
) -> Result<u64, ChronicleError> {
    let agent_id = agent_id.to_string();
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM session_messages WHERE agent_id = ?1 AND session_id = ?2",
                params![agent_id, session_id],
                |row| row.get(0),
            )
        })
        .await
        .map(|count| count as u64)
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::Role;
    use chronicle_core::types::CHECKPOINT_KEY;

    fn msgs(texts: &[&str]) -> Vec<Message> {
        texts
            .iter()
            .map(|t| Message::user(*t).with_id(format!("id-{t}")))
            .collect()
    }

    fn texts(messages: &[Message]) -> Vec<String> {
        messages.iter().map(Message::text).collect()
    }

    async fn seeded(texts: &[&str]) -> Database {
        let db = Database::open_in_memory().await.unwrap();
        let token = CancellationToken::new();
        append_messages(&db, "agent", "s1", &msgs(texts), &token)
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn append_assigns_gapless_sequence_numbers() {
        let db = Database::open_in_memory().await.unwrap();
        let token = CancellationToken::new();
        let first = append_messages(&db, "agent", "s1", &msgs(&["a", "b"]), &token)
            .await
            .unwrap();
        let second = append_messages(&db, "agent", "s1", &msgs(&["c"]), &token)
            .await
            .unwrap();
        assert_eq!(first, AppendOutcome::Committed { first: 1, last: 2 });
        assert_eq!(second, AppendOutcome::Committed { first: 3, last: 3 });

        let stored = load_stored(&db, "agent", "s1", &LoadOptions::default())
            .await
            .unwrap();
        let seqs: Vec<i64> = stored.iter().map(|s| s.sequence_num).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn cancelled_append_writes_nothing() {
        let db = Database::open_in_memory().await.unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let outcome = append_messages(&db, "agent", "s1", &msgs(&["a"]), &token)
            .await
            .unwrap();
        assert_eq!(outcome, AppendOutcome::RolledBack);
        assert_eq!(count_messages(&db, "agent", "s1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn limit_returns_newest_in_chronological_order() {
        let db = seeded(&["a", "b", "c", "d", "e"]).await;
        let loaded = load_messages(&db, "agent", "s1", &LoadOptions::last(3))
            .await
            .unwrap();
        assert_eq!(texts(&loaded), vec!["c", "d", "e"]);
    }

    #[tokio::test]
    async fn after_message_id_is_exclusive() {
        let db = seeded(&["a", "b", "c", "d"]).await;
        let loaded = load_messages(&db, "agent", "s1", &LoadOptions::after("id-b"))
            .await
            .unwrap();
        assert_eq!(texts(&loaded), vec!["c", "d"]);
    }

    #[tokio::test]
    async fn unknown_after_id_returns_everything() {
        let db = seeded(&["a", "b"]).await;
        let loaded = load_messages(&db, "agent", "s1", &LoadOptions::after("missing"))
            .await
            .unwrap();
        assert_eq!(texts(&loaded), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn role_filter_and_limit_compose() {
        let db = Database::open_in_memory().await.unwrap();
        let token = CancellationToken::new();
        let batch = vec![
            Message::user("q1"),
            Message::agent("r1"),
            Message::user("q2"),
            Message::agent("r2"),
            Message::user("q3"),
        ];
        append_messages(&db, "agent", "s1", &batch, &token)
            .await
            .unwrap();

        let options = LoadOptions::last(2).with_roles([Role::User]);
        let loaded = load_messages(&db, "agent", "s1", &options).await.unwrap();
        assert_eq!(texts(&loaded), vec!["q2", "q3"]);
    }

    #[tokio::test]
    async fn last_checkpoint_finds_newest_and_can_be_skipped() {
        let db = Database::open_in_memory().await.unwrap();
        let token = CancellationToken::new();
        let checkpoint = |text: &str| {
            Message::new(Role::System, text).with_metadata(CHECKPOINT_KEY, true.into())
        };
        let batch = vec![
            Message::user("a"),
            checkpoint("first summary"),
            Message::user("b"),
            checkpoint("second summary"),
            Message::user("c"),
        ];
        append_messages(&db, "agent", "s1", &batch, &token)
            .await
            .unwrap();

        let found = last_checkpoint(&db, "agent", "s1").await.unwrap().unwrap();
        assert_eq!(found.text(), "second summary");

        let plain = load_messages(
            &db,
            "agent",
            "s1",
            &LoadOptions::default().without_checkpoints(),
        )
        .await
        .unwrap();
        assert_eq!(texts(&plain), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn user_message_with_marker_is_not_a_checkpoint() {
        let db = Database::open_in_memory().await.unwrap();
        let token = CancellationToken::new();
        let batch = vec![
            Message::new(Role::System, "real summary").with_metadata(CHECKPOINT_KEY, true.into()),
            Message::user("forged").with_metadata(CHECKPOINT_KEY, true.into()),
        ];
        append_messages(&db, "agent", "s1", &batch, &token)
            .await
            .unwrap();

        let found = last_checkpoint(&db, "agent", "s1").await.unwrap().unwrap();
        assert_eq!(found.text(), "real summary");
    }

    #[tokio::test]
    async fn payload_round_trips_every_field() {
        let db = Database::open_in_memory().await.unwrap();
        let token = CancellationToken::new();
        let original = Message::agent("result: \"ok\" \u{1F600}")
            .with_id("m-42")
            .with_task("task-1")
            .with_context("ctx-1")
            .with_part(chronicle_core::Part::Data {
                kind: "tool_result".into(),
                data: serde_json::json!({"rows": [1, 2, 3]}),
            })
            .with_metadata("source", "tool".into());
        append_messages(&db, "agent", "s1", std::slice::from_ref(&original), &token)
            .await
            .unwrap();

        let loaded = load_messages(&db, "agent", "s1", &LoadOptions::default())
            .await
            .unwrap();
        assert_eq!(loaded, vec![original]);
    }
}
