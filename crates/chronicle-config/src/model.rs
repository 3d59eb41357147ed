// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Chronicle memory runtime.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use chronicle_core::{Message, Role};
use serde::{Deserialize, Serialize};

/// Top-level Chronicle configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChronicleConfig {
    /// Agent identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Session store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Working-memory strategy selection and tuning.
    #[serde(default)]
    pub working_memory: WorkingMemoryConfig,

    /// Optional long-term semantic memory.
    #[serde(default)]
    pub long_term: LongTermConfig,
}

/// Agent identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Tenant key scoping every session this process reads and writes.
    #[serde(default = "default_agent_id")]
    pub id: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: default_agent_id(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_id() -> String {
    "chronicle".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// How long a writer waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("chronicle").join("chronicle.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("chronicle.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Which working-memory strategy filters history before generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Last N messages, no token accounting.
    BufferWindow,
    /// Token budget with summary checkpoints.
    #[default]
    SummaryBuffer,
}

/// Working-memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkingMemoryConfig {
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Messages kept by the buffer-window strategy.
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Model whose tokenizer measures the budget.
    #[serde(default = "default_model")]
    pub model: String,

    /// Context budget in tokens.
    #[serde(default = "default_budget")]
    pub budget: usize,

    /// Fraction of the budget that triggers summarization.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Fraction of the budget to shrink to after summarization.
    #[serde(default = "default_target")]
    pub target: f64,

    /// Histories shorter than this are never summarized.
    #[serde(default = "default_min_messages_before_summary")]
    pub min_messages_before_summary: usize,

    /// Floor on the number of recent messages kept verbatim.
    #[serde(default = "default_min_recent_messages")]
    pub min_recent_messages: usize,

    /// Share of the target budget reserved for recent messages.
    #[serde(default = "default_recent_budget_ratio")]
    pub recent_budget_ratio: f64,

    /// Reload ceiling for sessions that have no checkpoint yet.
    #[serde(default = "default_max_load_without_checkpoint")]
    pub max_load_without_checkpoint: usize,
}

impl Default for WorkingMemoryConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            window_size: default_window_size(),
            model: default_model(),
            budget: default_budget(),
            threshold: default_threshold(),
            target: default_target(),
            min_messages_before_summary: default_min_messages_before_summary(),
            min_recent_messages: default_min_recent_messages(),
            recent_budget_ratio: default_recent_budget_ratio(),
            max_load_without_checkpoint: default_max_load_without_checkpoint(),
        }
    }
}

fn default_window_size() -> usize {
    20
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_budget() -> usize {
    8000
}

fn default_threshold() -> f64 {
    0.85
}

fn default_target() -> f64 {
    0.70
}

fn default_min_messages_before_summary() -> usize {
    20
}

fn default_min_recent_messages() -> usize {
    10
}

fn default_recent_budget_ratio() -> f64 {
    0.6
}

fn default_max_load_without_checkpoint() -> usize {
    100
}

/// Long-term index implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LongTermIndex {
    /// Embedding similarity over a vector store.
    #[default]
    Vector,
    /// In-process word overlap, no embedder required.
    Keyword,
}

/// Which messages are forwarded to long-term memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageScope {
    /// Every message, including summaries.
    #[default]
    All,
    /// User and agent messages only.
    #[serde(alias = "conversational_only")]
    Conversational,
    /// Summary checkpoints only.
    SummariesOnly,
}

impl StorageScope {
    /// Whether a message belongs in long-term memory under this scope.
    pub fn admits(self, message: &Message) -> bool {
        match self {
            Self::All => true,
            Self::Conversational => {
                !message.is_checkpoint() && matches!(message.role, Role::User | Role::Agent)
            }
            Self::SummariesOnly => message.is_checkpoint(),
        }
    }
}

/// Long-term memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LongTermConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub index: LongTermIndex,

    #[serde(default)]
    pub storage_scope: StorageScope,

    /// Pending messages per session before a flush. 1 means immediate.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Prepend recalled messages to history reads.
    #[serde(default)]
    pub auto_recall: bool,

    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,

    /// Vector collection name.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Attempts before a failing batch is dropped.
    #[serde(default = "default_max_flush_attempts")]
    pub max_flush_attempts: u32,

    /// Also clear long-term entries when a session is deleted.
    #[serde(default)]
    pub clear_on_delete: bool,
}

impl Default for LongTermConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            index: LongTermIndex::default(),
            storage_scope: StorageScope::default(),
            batch_size: default_batch_size(),
            auto_recall: false,
            recall_limit: default_recall_limit(),
            collection: default_collection(),
            max_flush_attempts: default_max_flush_attempts(),
            clear_on_delete: false,
        }
    }
}

impl LongTermConfig {
    /// Auto-recall only takes effect with long-term memory enabled.
    pub fn effective_auto_recall(&self) -> bool {
        self.enabled && self.auto_recall
    }
}

fn default_batch_size() -> usize {
    1
}

fn default_recall_limit() -> usize {
    5
}

fn default_collection() -> String {
    "chronicle_session_memory".to_string()
}

fn default_max_flush_attempts() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::types::CHECKPOINT_KEY;

    fn checkpoint() -> Message {
        Message::new(Role::System, "summary").with_metadata(CHECKPOINT_KEY, true.into())
    }

    #[test]
    fn scope_all_admits_everything() {
        assert!(StorageScope::All.admits(&Message::user("hi")));
        assert!(StorageScope::All.admits(&Message::new(Role::System, "note")));
        assert!(StorageScope::All.admits(&checkpoint()));
    }

    #[test]
    fn scope_conversational_skips_system_and_summaries() {
        let scope = StorageScope::Conversational;
        assert!(scope.admits(&Message::user("hi")));
        assert!(scope.admits(&Message::agent("hello")));
        assert!(!scope.admits(&Message::new(Role::System, "note")));
        assert!(!scope.admits(&checkpoint()));
    }

    #[test]
    fn scope_summaries_only_admits_checkpoints() {
        let scope = StorageScope::SummariesOnly;
        assert!(!scope.admits(&Message::user("hi")));
        assert!(scope.admits(&checkpoint()));
    }

    #[test]
    fn auto_recall_forced_off_when_disabled() {
        let config = LongTermConfig {
            auto_recall: true,
            ..LongTermConfig::default()
        };
        assert!(!config.effective_auto_recall());

        let enabled = LongTermConfig {
            enabled: true,
            auto_recall: true,
            ..LongTermConfig::default()
        };
        assert!(enabled.effective_auto_recall());
    }
}
