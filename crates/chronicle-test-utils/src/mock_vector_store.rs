// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process vector store with injectable upsert failures.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chronicle_core::{
    AdapterType, ChronicleError, HealthStatus, MetadataFilter, PluginAdapter, VectorDocument,
    VectorHit, VectorStore,
};
use serde_json::{Map, Value};

type Collection = HashMap<String, VectorDocument>;

#[derive(Default)]
pub struct MemoryVectorStore {
    collections: Mutex<HashMap<String, Collection>>,
    failing_upserts: AtomicUsize,
    upserts: AtomicUsize,
}

fn matches(metadata: &Map<String, Value>, filter: &MetadataFilter) -> bool {
    filter
        .iter()
        .all(|(k, v)| metadata.get(k).and_then(Value::as_str) == Some(v.as_str()))
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` upserts fail.
    pub fn fail_next_upserts(&self, n: usize) {
        self.failing_upserts.store(n, Ordering::SeqCst);
    }

    /// Successful upserts so far.
    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    /// Documents currently in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .expect("vector store lock poisoned")
            .get(collection)
            .map_or(0, HashMap::len)
    }

    /// `content` metadata of every document in a collection, sorted.
    pub fn contents(&self, collection: &str) -> Vec<String> {
        let guard = self.collections.lock().expect("vector store lock poisoned");
        let mut out: Vec<String> = guard
            .get(collection)
            .into_iter()
            .flat_map(|c| c.values())
            .filter_map(|d| d.metadata.get("content").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        out.sort();
        out
    }
}

#[async_trait]
impl PluginAdapter for MemoryVectorStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::VectorStore
    }

    async fn health_check(&self) -> Result<HealthStatus, ChronicleError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(
        &self,
        collection: &str,
        document: VectorDocument,
    ) -> Result<(), ChronicleError> {
        let remaining = self.failing_upserts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_upserts.store(remaining - 1, Ordering::SeqCst);
            return Err(ChronicleError::storage(std::io::Error::other(
                "injected upsert failure",
            )));
        }
        self.collections
            .lock()
            .expect("vector store lock poisoned")
            .entry(collection.to_string())
            .or_default()
            .insert(document.id.clone(), document);
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<VectorHit>, ChronicleError> {
        let guard = self.collections.lock().expect("vector store lock poisoned");
        let mut hits: Vec<VectorHit> = guard
            .get(collection)
            .into_iter()
            .flat_map(|c| c.values())
            .filter(|d| matches(&d.metadata, filter))
            .map(|d| VectorHit {
                id: d.id.clone(),
                score: cosine(query, &d.vector),
                metadata: d.metadata.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn delete_by_filter(
        &self,
        collection: &str,
        filter: &MetadataFilter,
    ) -> Result<u64, ChronicleError> {
        let mut guard = self.collections.lock().expect("vector store lock poisoned");
        let Some(docs) = guard.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|_, d| !matches(&d.metadata, filter));
        Ok((before - docs.len()) as u64)
    }
}
