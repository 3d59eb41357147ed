// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the SessionStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use chronicle_config::model::StorageConfig;
use chronicle_core::{
    AdapterType, CancellationToken, ChronicleError, HealthStatus, LoadOptions, Message,
    PluginAdapter, SessionMetadata, SessionStore,
};

use crate::database::{Database, DatabaseOptions, map_tr_err};
use crate::models::AppendOutcome;
use crate::queries;

/// SQLite-backed session store.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules. The
/// database is opened on [`SqliteSessionStore::initialize`], or supplied up
/// front with [`SqliteSessionStore::with_database`].
pub struct SqliteSessionStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteSessionStore {
    /// Create a store for the given configuration. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create a store over an already-open database.
    pub fn with_database(db: Database) -> Self {
        Self {
            config: StorageConfig::default(),
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// Opens the configured database and runs migrations.
    pub async fn initialize(&self) -> Result<(), ChronicleError> {
        let db = Database::open_with(
            &self.config.database_path,
            &DatabaseOptions::from(&self.config),
        )
        .await?;
        self.db.set(db).map_err(|_| ChronicleError::Storage {
            source: "session store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite session store initialized");
        Ok(())
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, ChronicleError> {
        self.db.get().ok_or_else(|| ChronicleError::Storage {
            source: "session store not initialized -- call initialize() first".into(),
        })
    }
}

fn require_ids(agent_id: &str, session_id: &str) -> Result<(), ChronicleError> {
    if agent_id.trim().is_empty() {
        return Err(ChronicleError::InvalidInput("agent id must not be empty".into()));
    }
    if session_id.trim().is_empty() {
        return Err(ChronicleError::InvalidInput(
            "session id must not be empty".into(),
        ));
    }
    Ok(())
}

#[async_trait]
impl PluginAdapter for SqliteSessionStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SessionStore
    }

    async fn health_check(&self) -> Result<HealthStatus, ChronicleError> {
        let db = self.database()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn ensure_session(
        &self,
        agent_id: &str,
        session_id: &str,
    ) -> Result<SessionMetadata, ChronicleError> {
        require_ids(agent_id, session_id)?;
        queries::sessions::ensure_session(self.database()?, agent_id, session_id).await
    }

    async fn append_messages(
        &self,
        agent_id: &str,
        session_id: &str,
        messages: &[Message],
        cancel: &CancellationToken,
    ) -> Result<(), ChronicleError> {
        require_ids(agent_id, session_id)?;
        if messages.is_empty() {
            return Ok(());
        }
        for message in messages {
            message.validate()?;
        }

        let outcome = queries::messages::append_messages(
            self.database()?,
            agent_id,
            session_id,
            messages,
            cancel,
        )
        .await?;
        match outcome {
            AppendOutcome::Committed { first, last } => {
                debug!(agent_id, session_id, first, last, "messages appended");
                Ok(())
            }
            AppendOutcome::RolledBack => Err(ChronicleError::Cancelled),
        }
    }

    async fn load_messages(
        &self,
        agent_id: &str,
        session_id: &str,
        options: &LoadOptions,
    ) -> Result<Vec<Message>, ChronicleError> {
        require_ids(agent_id, session_id)?;
        queries::messages::load_messages(self.database()?, agent_id, session_id, options).await
    }

    async fn last_checkpoint(
        &self,
        agent_id: &str,
        session_id: &str,
    ) -> Result<Option<Message>, ChronicleError> {
        require_ids(agent_id, session_id)?;
        queries::messages::last_checkpoint(self.database()?, agent_id, session_id).await
    }

    async fn count_messages(
        &self,
        agent_id: &str,
        session_id: &str,
    ) -> Result<u64, ChronicleError> {
        require_ids(agent_id, session_id)?;
        queries::messages::count_messages(self.database()?, agent_id, session_id).await
    }

    async fn delete_session(&self, agent_id: &str, session_id: &str) -> Result<(), ChronicleError> {
        require_ids(agent_id, session_id)?;
        let existed =
            queries::sessions::delete_session(self.database()?, agent_id, session_id).await?;
        debug!(agent_id, session_id, existed, "session deleted");
        Ok(())
    }

    async fn list_sessions(&self, agent_id: &str) -> Result<Vec<SessionMetadata>, ChronicleError> {
        queries::sessions::list_sessions(self.database()?, agent_id).await
    }

    async fn close(&self) -> Result<(), ChronicleError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
        }
        Ok(())
    }
}
