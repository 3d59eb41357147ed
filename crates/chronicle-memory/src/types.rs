// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Index entries and vector helpers for long-term memory.

use std::str::FromStr;

use chronicle_core::{Message, Role, VectorHit};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Metadata keys written alongside every indexed message.
pub mod keys {
    pub const AGENT_ID: &str = "agent_id";
    pub const SESSION_ID: &str = "session_id";
    pub const USER_ID: &str = "user_id";
    pub const ROLE: &str = "role";
    pub const CONTENT: &str = "content";
    pub const MESSAGE_INDEX: &str = "message_index";
    pub const MESSAGE_ID: &str = "message_id";
    pub const TIMESTAMP: &str = "timestamp";
}

/// A derived, rebuildable projection of one message in the long-term index.
///
/// The session store stays the source of truth. Entries can always be
/// regenerated by replaying a session's messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub session_id: String,
    pub message_id: String,
    pub agent_id: String,
    /// Optional scoping key carried through from message metadata.
    pub user_id: Option<String>,
    pub author: Role,
    pub content: String,
    pub timestamp: String,
    /// Relevance assigned at query time. Zero when stored.
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl IndexEntry {
    /// Projects a message. Returns `None` when it carries no text to index.
    pub fn from_message(agent_id: &str, session_id: &str, message: &Message) -> Option<Self> {
        let content = message.text();
        if content.trim().is_empty() {
            return None;
        }
        let user_id = message
            .metadata
            .get(keys::USER_ID)
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self {
            session_id: session_id.to_string(),
            message_id: message.id.clone(),
            agent_id: agent_id.to_string(),
            user_id,
            author: message.role,
            content,
            timestamp: message.created_at.clone(),
            score: 0.0,
            metadata: Map::new(),
        })
    }

    /// Metadata stored with the vector document. `index` is the message's
    /// position within the batch that indexed it.
    pub fn to_metadata(&self, index: usize) -> Map<String, Value> {
        let mut metadata = self.metadata.clone();
        metadata.insert(keys::AGENT_ID.into(), json!(self.agent_id));
        metadata.insert(keys::SESSION_ID.into(), json!(self.session_id));
        metadata.insert(keys::ROLE.into(), json!(self.author.to_string()));
        metadata.insert(keys::CONTENT.into(), json!(self.content));
        metadata.insert(keys::MESSAGE_INDEX.into(), json!(index));
        metadata.insert(keys::MESSAGE_ID.into(), json!(self.message_id));
        metadata.insert(keys::TIMESTAMP.into(), json!(self.timestamp));
        if let Some(user_id) = &self.user_id {
            metadata.insert(keys::USER_ID.into(), json!(user_id));
        }
        metadata
    }

    /// Rebuilds an entry from a search hit. Missing or unknown roles fall
    /// back to `agent`.
    pub fn from_hit(hit: VectorHit) -> Self {
        let text = |key: &str| {
            hit.metadata
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let author = text(keys::ROLE)
            .and_then(|r| Role::from_str(&r).ok())
            .unwrap_or(Role::Agent);
        Self {
            session_id: text(keys::SESSION_ID).unwrap_or_default(),
            message_id: text(keys::MESSAGE_ID).unwrap_or_else(|| hit.id.clone()),
            agent_id: text(keys::AGENT_ID).unwrap_or_default(),
            user_id: text(keys::USER_ID),
            author,
            content: text(keys::CONTENT).unwrap_or_default(),
            timestamp: text(keys::TIMESTAMP).unwrap_or_default(),
            score: hit.score,
            metadata: hit.metadata,
        }
    }

    /// Converts a recalled entry back into a message for the prompt.
    pub fn into_message(self) -> Message {
        let mut message = Message::new(self.author, self.content)
            .with_id(self.message_id)
            .with_metadata("recalled", json!(true))
            .with_metadata("score", json!(self.score));
        if !self.timestamp.is_empty() {
            message.created_at = self.timestamp;
        }
        message
    }
}

/// Convert an f32 vector to a little-endian SQLite BLOB.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a SQLite BLOB back to an f32 vector. Trailing bytes are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity. Mismatched lengths and zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_to_blob_roundtrip() {
        let original = vec![0.1_f32, 0.2, 0.3, -0.5, 1.0];
        let recovered = blob_to_vec(&vec_to_blob(&original));
        assert_eq!(original.len(), recovered.len());
        for (a, b) in original.iter().zip(recovered.iter()) {
            assert!((a - b).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn blob_ignores_trailing_bytes() {
        let mut blob = vec_to_blob(&[1.0, 2.0]);
        blob.push(7);
        assert_eq!(blob_to_vec(&blob), vec![1.0, 2.0]);
    }

    #[test]
    fn cosine_similarity_identical_and_orthogonal() {
        let v = vec![0.3_f32, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn empty_text_is_not_indexed() {
        let message = Message::user("   ");
        assert!(IndexEntry::from_message("a", "s", &message).is_none());
    }

    #[test]
    fn metadata_round_trips_through_hit() {
        let message = Message::agent("the deploy finished")
            .with_id("m-7")
            .with_metadata(keys::USER_ID, json!("u-1"));
        let entry = IndexEntry::from_message("agent-a", "sess-1", &message).unwrap();
        let metadata = entry.to_metadata(3);
        assert_eq!(metadata[keys::MESSAGE_INDEX], json!(3));
        assert_eq!(metadata[keys::ROLE], json!("agent"));

        let back = IndexEntry::from_hit(VectorHit {
            id: "doc-1".into(),
            score: 0.9,
            metadata,
        });
        assert_eq!(back.message_id, "m-7");
        assert_eq!(back.user_id.as_deref(), Some("u-1"));
        assert_eq!(back.author, Role::Agent);
        assert_eq!(back.content, "the deploy finished");
    }

    #[test]
    fn missing_role_defaults_to_agent() {
        let mut metadata = Map::new();
        metadata.insert(keys::CONTENT.into(), json!("hello"));
        let entry = IndexEntry::from_hit(VectorHit {
            id: "doc-2".into(),
            score: 0.5,
            metadata,
        });
        assert_eq!(entry.author, Role::Agent);
        assert_eq!(entry.message_id, "doc-2");

        let message = entry.into_message();
        assert_eq!(message.role, Role::Agent);
        assert_eq!(message.text(), "hello");
        assert_eq!(message.metadata["recalled"], json!(true));
    }
}
