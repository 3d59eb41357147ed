// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temp-file session store harness.

use std::sync::Arc;

use chronicle_core::{ChronicleError, Message, Role};
use chronicle_storage::{Database, SqliteSessionStore};
use tempfile::TempDir;

/// A migrated SQLite store living in a temporary directory.
///
/// The directory is removed when the harness is dropped.
pub struct TestStore {
    pub store: Arc<SqliteSessionStore>,
    pub db: Database,
    _dir: TempDir,
}

impl TestStore {
    pub async fn new() -> Result<Self, ChronicleError> {
        let dir = tempfile::tempdir().map_err(ChronicleError::storage)?;
        let path = dir.path().join("chronicle-test.db");
        let db = Database::open(&path.to_string_lossy()).await?;
        Ok(Self {
            store: Arc::new(SqliteSessionStore::with_database(db.clone())),
            db,
            _dir: dir,
        })
    }
}

/// `n` alternating user/agent messages with ids `{prefix}-0 ..`.
pub fn conversation(prefix: &str, n: usize) -> Vec<Message> {
    (0..n)
        .map(|i| {
            let role = if i % 2 == 0 { Role::User } else { Role::Agent };
            Message::new(role, format!("{prefix} message {i}")).with_id(format!("{prefix}-{i}"))
        })
        .collect()
}
