// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory for the Chronicle memory runtime.
//!
//! Long-term memory is an optional, derived index over all-time session
//! history, queried to recall relevant older messages:
//!
//! - [`VectorMemory`]: embeddings in a [`chronicle_core::VectorStore`].
//! - [`KeywordMemory`]: in-process word-overlap index.
//! - [`SqliteVectorStore`]: a vector store over the session database.

pub mod keyword;
pub mod store;
pub mod types;
pub mod vector;

use std::sync::Arc;

use chronicle_config::model::{LongTermConfig, LongTermIndex};
use chronicle_core::{ChronicleError, Embedder, Message, VectorStore};

pub use keyword::KeywordMemory;
pub use store::SqliteVectorStore;
pub use types::IndexEntry;
pub use vector::VectorMemory;

/// The long-term memory capability over its supported indexes.
pub enum LongTermMemory {
    Vector(VectorMemory),
    Keyword(KeywordMemory),
}

impl LongTermMemory {
    /// Builds the configured index. Returns `None` when long-term memory is
    /// disabled. The vector index needs both an embedder and a vector store.
    pub fn from_config(
        config: &LongTermConfig,
        embedder: Option<Arc<dyn Embedder>>,
        vector_store: Option<Arc<dyn VectorStore>>,
    ) -> Result<Option<Self>, ChronicleError> {
        if !config.enabled {
            return Ok(None);
        }
        match config.index {
            LongTermIndex::Keyword => Ok(Some(Self::Keyword(KeywordMemory::new()))),
            LongTermIndex::Vector => match (embedder, vector_store) {
                (Some(embedder), Some(vector_store)) => Ok(Some(Self::Vector(VectorMemory::new(
                    embedder,
                    vector_store,
                    config.collection.clone(),
                )))),
                _ => Err(ChronicleError::Config(
                    "long_term.index = \"vector\" requires an embedder and a vector store".into(),
                )),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Vector(_) => "vector",
            Self::Keyword(_) => "keyword",
        }
    }

    /// Indexes a batch. Returns how many messages were stored.
    pub async fn store(
        &self,
        agent_id: &str,
        session_id: &str,
        messages: &[Message],
    ) -> Result<usize, ChronicleError> {
        match self {
            Self::Vector(memory) => memory.store(agent_id, session_id, messages).await,
            Self::Keyword(memory) => memory.store(agent_id, session_id, messages).await,
        }
    }

    /// Recalls up to `limit` messages relevant to `query`. An empty query
    /// returns nothing.
    pub async fn recall(
        &self,
        agent_id: &str,
        session_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Message>, ChronicleError> {
        match self {
            Self::Vector(memory) => memory.recall(agent_id, session_id, query, limit).await,
            Self::Keyword(memory) => memory.recall(agent_id, session_id, query, limit).await,
        }
    }

    /// Removes every entry for the session.
    pub async fn clear(&self, agent_id: &str, session_id: &str) -> Result<u64, ChronicleError> {
        match self {
            Self::Vector(memory) => memory.clear(agent_id, session_id).await,
            Self::Keyword(memory) => memory.clear(agent_id, session_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_test_utils::{HashEmbedder, MemoryVectorStore};

    fn enabled(index: LongTermIndex) -> LongTermConfig {
        LongTermConfig {
            enabled: true,
            index,
            ..LongTermConfig::default()
        }
    }

    #[test]
    fn disabled_builds_nothing() {
        let built = LongTermMemory::from_config(&LongTermConfig::default(), None, None).unwrap();
        assert!(built.is_none());
    }

    #[test]
    fn keyword_needs_no_embedder() {
        let built = LongTermMemory::from_config(&enabled(LongTermIndex::Keyword), None, None)
            .unwrap()
            .unwrap();
        assert_eq!(built.name(), "keyword");
    }

    #[test]
    fn vector_without_embedder_is_config_error() {
        let store: Arc<dyn VectorStore> = Arc::new(MemoryVectorStore::new());
        let err = LongTermMemory::from_config(&enabled(LongTermIndex::Vector), None, Some(store))
            .err()
            .unwrap();
        assert!(matches!(err, ChronicleError::Config(_)));
    }

    #[tokio::test]
    async fn vector_dispatch_round_trip() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());
        let store: Arc<dyn VectorStore> = Arc::new(MemoryVectorStore::new());
        let memory =
            LongTermMemory::from_config(&enabled(LongTermIndex::Vector), Some(embedder), Some(store))
                .unwrap()
                .unwrap();
        assert_eq!(memory.name(), "vector");

        memory
            .store("a", "s", &[Message::user("paris is the capital of france")])
            .await
            .unwrap();
        let recalled = memory.recall("a", "s", "capital of france", 3).await.unwrap();
        assert_eq!(recalled.len(), 1);
        assert_eq!(memory.clear("a", "s").await.unwrap(), 1);
    }
}
