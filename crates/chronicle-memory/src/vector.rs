// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding-backed long-term memory.

use std::sync::Arc;

use chronicle_core::{ChronicleError, Embedder, Message, MetadataFilter, VectorDocument, VectorStore};
use tracing::{debug, warn};

use crate::types::{IndexEntry, keys};

/// Indexes messages as embeddings in a [`VectorStore`] collection and
/// recalls them by semantic similarity, scoped to one agent and session.
#[derive(Clone)]
pub struct VectorMemory {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    collection: String,
}

fn scope_filter(agent_id: &str, session_id: &str) -> MetadataFilter {
    MetadataFilter::from([
        (keys::AGENT_ID.to_string(), agent_id.to_string()),
        (keys::SESSION_ID.to_string(), session_id.to_string()),
    ])
}

impl VectorMemory {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Embeds and upserts every message with text. Returns how many were stored.
    ///
    /// A message whose embedding fails is skipped. An upsert failure aborts
    /// the rest of the batch.
    pub async fn store(
        &self,
        agent_id: &str,
        session_id: &str,
        messages: &[Message],
    ) -> Result<usize, ChronicleError> {
        let mut stored = 0;
        for (index, message) in messages.iter().enumerate() {
            let Some(entry) = IndexEntry::from_message(agent_id, session_id, message) else {
                continue;
            };
            let vector = match self.embedder.embed(&entry.content).await {
                Ok(vector) => vector,
                Err(e) => {
                    warn!(
                        session_id,
                        message_id = %entry.message_id,
                        error = %e,
                        "embedding failed, message not indexed"
                    );
                    continue;
                }
            };
            let document = VectorDocument {
                id: uuid::Uuid::new_v4().to_string(),
                vector,
                metadata: entry.to_metadata(index),
            };
            self.vector_store
                .upsert(&self.collection, document)
                .await
                .map_err(|e| ChronicleError::long_term("vector upsert failed", Some(e)))?;
            stored += 1;
        }
        debug!(session_id, stored, total = messages.len(), "long-term batch indexed");
        Ok(stored)
    }

    /// Returns up to `limit` messages most similar to `query`.
    pub async fn recall(
        &self,
        agent_id: &str,
        session_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Message>, ChronicleError> {
        if query.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| ChronicleError::recall("query embedding failed", e))?;
        let hits = self
            .vector_store
            .search(
                &self.collection,
                &vector,
                limit,
                &scope_filter(agent_id, session_id),
            )
            .await
            .map_err(|e| ChronicleError::recall("vector search failed", e))?;
        Ok(hits
            .into_iter()
            .map(|hit| IndexEntry::from_hit(hit).into_message())
            .collect())
    }

    /// Deletes every entry for the session.
    pub async fn clear(&self, agent_id: &str, session_id: &str) -> Result<u64, ChronicleError> {
        self.vector_store
            .delete_by_filter(&self.collection, &scope_filter(agent_id, session_id))
            .await
            .map_err(|e| ChronicleError::long_term("vector delete failed", Some(e)))
    }
}
