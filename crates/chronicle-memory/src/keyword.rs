// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process keyword index used when no embedder is configured.

use std::collections::{HashMap, HashSet};

use chronicle_core::{ChronicleError, Message};
use tokio::sync::RwLock;
use tracing::debug;

use crate::types::IndexEntry;

type ScopeKey = (String, String);

struct Indexed {
    entry: IndexEntry,
    terms: HashSet<String>,
}

/// Word-overlap index of [`IndexEntry`]s keyed by `(agent_id, session_id)`.
///
/// Entries live only as long as the process. They can be rebuilt from the
/// session store at any time.
#[derive(Default)]
pub struct KeywordMemory {
    entries: RwLock<HashMap<ScopeKey, Vec<Indexed>>>,
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn scope(agent_id: &str, session_id: &str) -> ScopeKey {
    (agent_id.to_string(), session_id.to_string())
}

impl KeywordMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn store(
        &self,
        agent_id: &str,
        session_id: &str,
        messages: &[Message],
    ) -> Result<usize, ChronicleError> {
        let indexed: Vec<Indexed> = messages
            .iter()
            .filter_map(|m| IndexEntry::from_message(agent_id, session_id, m))
            .map(|entry| Indexed {
                terms: terms(&entry.content),
                entry,
            })
            .collect();
        let stored = indexed.len();
        self.entries
            .write()
            .await
            .entry(scope(agent_id, session_id))
            .or_default()
            .extend(indexed);
        debug!(session_id, stored, "keyword entries indexed");
        Ok(stored)
    }

    /// Ranks entries by the share of query words they contain. Entries with
    /// no overlap are never returned. Ties go to the newer entry.
    pub async fn recall(
        &self,
        agent_id: &str,
        session_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Message>, ChronicleError> {
        let query_terms = terms(query);
        if query_terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let guard = self.entries.read().await;
        let Some(entries) = guard.get(&scope(agent_id, session_id)) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(usize, f32)> = entries
            .iter()
            .enumerate()
            .filter_map(|(pos, indexed)| {
                let overlap = query_terms.intersection(&indexed.terms).count();
                (overlap > 0).then(|| (pos, overlap as f32 / query_terms.len() as f32))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(b.0.cmp(&a.0)));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(pos, score)| {
                let mut entry = entries[pos].entry.clone();
                entry.score = score;
                entry.into_message()
            })
            .collect())
    }

    pub async fn clear(&self, agent_id: &str, session_id: &str) -> Result<u64, ChronicleError> {
        let removed = self
            .entries
            .write()
            .await
            .remove(&scope(agent_id, session_id))
            .map_or(0, |entries| entries.len());
        Ok(removed as u64)
    }

    /// Number of entries indexed for a session.
    pub async fn len(&self, agent_id: &str, session_id: &str) -> usize {
        self.entries
            .read()
            .await
            .get(&scope(agent_id, session_id))
            .map_or(0, Vec::len)
    }
}
