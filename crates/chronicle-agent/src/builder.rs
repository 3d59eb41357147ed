// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembles a [`MemoryService`] from configuration and capabilities.

use std::sync::Arc;

use chronicle_config::model::{ChronicleConfig, LongTermIndex};
use chronicle_context::WorkingMemory;
use chronicle_core::{ChronicleError, Embedder, SessionStore, Summarizer, VectorStore};
use chronicle_memory::{LongTermMemory, SqliteVectorStore};
use chronicle_storage::{Database, SqliteSessionStore};
use tracing::info;

use crate::service::MemoryService;

/// Builder for [`MemoryService`].
///
/// Without an explicit store, the configured SQLite database is opened. A
/// vector index without an explicit vector store uses that same database.
pub struct MemoryServiceBuilder {
    config: ChronicleConfig,
    store: Option<Arc<dyn SessionStore>>,
    database: Option<Database>,
    summarizer: Option<Arc<dyn Summarizer>>,
    embedder: Option<Arc<dyn Embedder>>,
    vector_store: Option<Arc<dyn VectorStore>>,
}

impl MemoryServiceBuilder {
    pub fn new(config: ChronicleConfig) -> Self {
        Self {
            config,
            store: None,
            database: None,
            summarizer: None,
            embedder: None,
            vector_store: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Uses an already-open database for the session store and, when
    /// needed, the vector store.
    pub fn with_database(mut self, db: Database) -> Self {
        self.database = Some(db);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_vector_store(mut self, vector_store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(vector_store);
        self
    }

    pub async fn build(self) -> Result<MemoryService, ChronicleError> {
        let config = self.config;
        let working_memory = WorkingMemory::from_config(&config.working_memory, self.summarizer)?;

        let needs_database = self.store.is_none()
            || (config.long_term.enabled
                && config.long_term.index == LongTermIndex::Vector
                && self.vector_store.is_none());
        let database = match self.database {
            Some(db) => Some(db),
            None if needs_database => Some(Database::open_config(&config.storage).await?),
            None => None,
        };

        let store: Arc<dyn SessionStore> = match (self.store, &database) {
            (Some(store), _) => store,
            (None, Some(db)) => Arc::new(SqliteSessionStore::with_database(db.clone())),
            (None, None) => {
                return Err(ChronicleError::Internal(
                    "no session store or database available".into(),
                ));
            }
        };

        let vector_store = match (self.vector_store, &database) {
            (Some(vs), _) => Some(vs),
            (None, Some(db)) if self.embedder.is_some() => {
                Some(Arc::new(SqliteVectorStore::new(db.clone())) as Arc<dyn VectorStore>)
            }
            _ => None,
        };
        let long_term = LongTermMemory::from_config(&config.long_term, self.embedder, vector_store)?;

        info!(
            agent_id = %config.agent.id,
            working_memory = working_memory.name(),
            long_term = long_term.as_ref().map_or("disabled", LongTermMemory::name),
            "memory service ready"
        );
        Ok(MemoryService::new(
            config.agent.id.clone(),
            store,
            working_memory,
            long_term,
            config.long_term,
        ))
    }
}
