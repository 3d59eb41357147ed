// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed vector store with BLOB embeddings and JSON metadata.
//!
//! Filtering happens in SQL via `json_extract`; similarity is computed in
//! Rust over the filtered candidates.

use async_trait::async_trait;
use chrono::Utc;
use chronicle_core::{
    AdapterType, ChronicleError, HealthStatus, MetadataFilter, PluginAdapter, VectorDocument,
    VectorHit, VectorStore,
};
use chronicle_storage::Database;
use chronicle_storage::database::map_tr_err;
use serde_json::{Map, Value};
use tracing::debug;

use crate::types::{blob_to_vec, cosine_similarity, vec_to_blob};

/// Vector store over the `vector_documents` table of a [`Database`].
#[derive(Clone)]
pub struct SqliteVectorStore {
    db: Database,
}

impl SqliteVectorStore {
    /// Wraps an open, migrated database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> Result<u64, ChronicleError> {
        let collection = collection.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<u64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM vector_documents WHERE collection = ?1",
                    rusqlite::params![collection],
                    |row| row.get(0),
                )
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Builds `AND json_extract(...) = ?` clauses for a filter. Parameter 1 is
/// always the collection.
fn filter_clause(filter: &MetadataFilter) -> Result<(String, Vec<String>), ChronicleError> {
    let mut sql = String::new();
    let mut params = Vec::with_capacity(filter.len() * 2);
    for (key, value) in filter {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ChronicleError::InvalidInput(format!(
                "metadata filter key `{key}` must be alphanumeric"
            )));
        }
        let path_idx = params.len() + 2;
        sql.push_str(&format!(
            " AND json_extract(metadata, ?{path_idx}) = ?{}",
            path_idx + 1
        ));
        params.push(format!("$.{key}"));
        params.push(value.clone());
    }
    Ok((sql, params))
}

#[async_trait]
impl PluginAdapter for SqliteVectorStore {
    fn name(&self) -> &str {
        "sqlite-vector"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::VectorStore
    }

    async fn health_check(&self) -> Result<HealthStatus, ChronicleError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM vector_documents", [], |_| Ok(()))
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert(
        &self,
        collection: &str,
        document: VectorDocument,
    ) -> Result<(), ChronicleError> {
        if document.vector.is_empty() {
            return Err(ChronicleError::InvalidInput(
                "vector document has no embedding".into(),
            ));
        }
        let collection = collection.to_string();
        let blob = vec_to_blob(&document.vector);
        let metadata =
            serde_json::to_string(&document.metadata).map_err(ChronicleError::storage)?;
        let id = document.id;
        let created_at = Utc::now().to_rfc3339();

        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT OR REPLACE INTO vector_documents (collection, id, embedding, metadata, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![collection, id, blob, metadata, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<VectorHit>, ChronicleError> {
        if limit == 0 || query.is_empty() {
            return Ok(Vec::new());
        }
        let (clause, filter_params) = filter_clause(filter)?;
        let sql = format!(
            "SELECT id, embedding, metadata FROM vector_documents WHERE collection = ?1{clause}"
        );
        let mut params = vec![collection.to_string()];
        params.extend(filter_params);

        let rows = self
            .db
            .connection()
            .call(move |conn| -> Result<Vec<(String, Vec<u8>, String)>, rusqlite::Error> {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)?;

        let candidates = rows.len();
        let mut hits = Vec::with_capacity(candidates);
        for (id, blob, metadata) in rows {
            let metadata: Map<String, Value> =
                serde_json::from_str(&metadata).map_err(ChronicleError::storage)?;
            let score = cosine_similarity(query, &blob_to_vec(&blob));
            hits.push(VectorHit {
                id,
                score,
                metadata,
            });
        }
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        debug!(candidates, returned = hits.len(), "vector search complete");
        Ok(hits)
    }

    async fn delete_by_filter(
        &self,
        collection: &str,
        filter: &MetadataFilter,
    ) -> Result<u64, ChronicleError> {
        let (clause, filter_params) = filter_clause(filter)?;
        let sql = format!("DELETE FROM vector_documents WHERE collection = ?1{clause}");
        let mut params = vec![collection.to_string()];
        params.extend(filter_params);

        let deleted = self
            .db
            .connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(&sql, rusqlite::params_from_iter(params.iter()))
            })
            .await
            .map_err(map_tr_err)?;
        Ok(deleted as u64)
    }
}
