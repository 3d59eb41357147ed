// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements run on tokio-rusqlite's single background thread. Clones of
//! [`Database`] share that thread.

use std::path::Path;
use std::time::Duration;

use chronicle_config::model::StorageConfig;
use chronicle_core::ChronicleError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations::run_migrations;

/// Converts a tokio-rusqlite call error into a storage error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ChronicleError {
    ChronicleError::Storage {
        source: Box::new(e),
    }
}

/// Connection-level settings applied on open.
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub wal_mode: bool,
    pub busy_timeout: Duration,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            wal_mode: true,
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

impl From<&StorageConfig> for DatabaseOptions {
    fn from(config: &StorageConfig) -> Self {
        Self {
            wal_mode: config.wal_mode,
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
        }
    }
}

/// Handle to the migrated SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path` with default options.
    pub async fn open(path: &str) -> Result<Self, ChronicleError> {
        Self::open_with(path, &DatabaseOptions::default()).await
    }

    /// Opens the database described by a storage config section.
    pub async fn open_config(config: &StorageConfig) -> Result<Self, ChronicleError> {
        Self::open_with(&config.database_path, &DatabaseOptions::from(config)).await
    }

    pub async fn open_with(path: &str, options: &DatabaseOptions) -> Result<Self, ChronicleError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(ChronicleError::storage)?;
        }
        let conn = Connection::open(path).await.map_err(ChronicleError::storage)?;
        let db = Self { conn };
        db.prepare(options).await?;
        debug!(path, wal = options.wal_mode, "database opened");
        Ok(db)
    }

    /// Opens a private in-memory database. Used by tests and dry runs.
    pub async fn open_in_memory() -> Result<Self, ChronicleError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(ChronicleError::storage)?;
        let db = Self { conn };
        db.prepare(&DatabaseOptions {
            wal_mode: false,
            ..DatabaseOptions::default()
        })
        .await?;
        Ok(db)
    }

    async fn prepare(&self, options: &DatabaseOptions) -> Result<(), ChronicleError> {
        let wal_mode = options.wal_mode;
        let busy_timeout = options.busy_timeout;
        self.conn
            .call(move |conn| -> Result<Result<(), ChronicleError>, rusqlite::Error> {
                conn.busy_timeout(busy_timeout)?;
                conn.execute_batch("PRAGMA foreign_keys = ON;")?;
                if wal_mode {
                    conn.pragma_update(None, "journal_mode", "WAL")?;
                    conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
                }
                Ok(run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// The shared async connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoints the WAL so the main database file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), ChronicleError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE);", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    /// Checkpoints and closes the connection.
    pub async fn close(self) -> Result<(), ChronicleError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(ChronicleError::storage)
    }
}
