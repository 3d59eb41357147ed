// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message model and common types shared by every Chronicle crate.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::error::ChronicleError;

/// Text every checkpoint message starts with.
pub const CHECKPOINT_PREFIX: &str = "Previous conversation summary: ";

/// Prefix used by summaries persisted before the structured marker existed.
pub const LEGACY_CHECKPOINT_PREFIX: &str = "Conversation summary:";

/// Metadata key marking a message as a summary checkpoint.
pub const CHECKPOINT_KEY: &str = "checkpoint";

/// Metadata key holding the id of the last message folded into a checkpoint.
pub const RESUME_AFTER_KEY: &str = "resume_after";

/// Callback invoked with human-readable progress strings during compaction.
pub type StatusNotifier = Arc<dyn Fn(&str) + Send + Sync>;

/// Metadata filter for vector search and deletion. All pairs must match.
pub type MetadataFilter = BTreeMap<String, String>;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of pluggable backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    SessionStore,
    VectorStore,
}

/// Author of a message.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Agent,
    /// Unspecified or system-like content, including summary checkpoints.
    System,
}

/// One piece of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text { text: String },
    /// Structured content such as a tool call or tool result, tagged by `kind`.
    Data { kind: String, data: Value },
}

/// An immutable unit of conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    /// RFC 3339 creation time. Informational only; ordering comes from the store.
    pub created_at: String,
}

impl Message {
    /// Creates a single-text-part message with a fresh id.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            parts: vec![Part::Text { text: text.into() }],
            task_id: None,
            context_id: None,
            metadata: Map::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Role::Agent, text)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_context(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Concatenated text parts, newline separated. Data parts are skipped.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            if let Part::Text { text } = part {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
        }
        out
    }

    /// Whether this message is a summary checkpoint.
    ///
    /// The structured metadata marker is authoritative. Rows written without
    /// it are recognized by a system role plus the sentinel prefix; user and
    /// agent messages are never treated as checkpoints.
    pub fn is_checkpoint(&self) -> bool {
        if self.role != Role::System {
            return false;
        }
        if self.metadata.get(CHECKPOINT_KEY) == Some(&Value::Bool(true)) {
            return true;
        }
        let text = self.text();
        text.starts_with(CHECKPOINT_PREFIX) || text.starts_with(LEGACY_CHECKPOINT_PREFIX)
    }

    /// Id of the last message a checkpoint covers, if recorded.
    pub fn resume_after(&self) -> Option<&str> {
        self.metadata.get(RESUME_AFTER_KEY).and_then(Value::as_str)
    }

    /// Rejects messages that cannot be persisted.
    pub fn validate(&self) -> Result<(), ChronicleError> {
        if self.id.trim().is_empty() {
            return Err(ChronicleError::InvalidInput(
                "message id must not be empty".into(),
            ));
        }
        if self.parts.is_empty() {
            return Err(ChronicleError::InvalidInput(format!(
                "message {} has no content parts",
                self.id
            )));
        }
        Ok(())
    }
}

/// Metadata of a persisted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub session_id: String,
    pub agent_id: String,
    pub metadata: Map<String, Value>,
    pub created_at: String,
    pub updated_at: String,
}

/// Options narrowing a session history read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOptions {
    /// Return only the newest N messages, still in chronological order.
    pub limit: Option<usize>,
    /// Return only messages strictly after this message.
    pub after_message_id: Option<String>,
    /// Restrict to these roles. Empty means all roles.
    pub roles: Vec<Role>,
    /// Exclude summary checkpoints from the result.
    pub skip_checkpoints: bool,
}

impl LoadOptions {
    pub fn last(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn after(message_id: impl Into<String>) -> Self {
        Self {
            after_message_id: Some(message_id.into()),
            ..Self::default()
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    pub fn without_checkpoints(mut self) -> Self {
        self.skip_checkpoints = true;
        self
    }
}

/// A document written to a vector backend.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDocument {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: Map<String, Value>,
}

/// A scored vector search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub id: String,
    pub score: f32,
    pub metadata: Map<String, Value>,
}
