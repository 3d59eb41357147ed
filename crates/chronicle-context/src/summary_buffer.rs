// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summary-buffer strategy: keeps history under a token budget by folding
//! old messages into a summary checkpoint.
//!
//! Compaction runs synchronously within the turn that crossed the threshold.
//! The session store is never edited; the checkpoint is appended as a new
//! message and reloads start from it.

use std::sync::Arc;

use chronicle_config::model::WorkingMemoryConfig;
use chronicle_core::{
    ChronicleError, LoadOptions, Message, SessionStore, StatusNotifier, Summarizer, TokenCounter,
};
use tracing::{debug, info, warn};

use crate::compaction::{build_checkpoint, split_point};
use crate::window::ConversationWindow;

/// Tuning for [`SummaryBuffer`].
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryBufferConfig {
    pub budget: usize,
    pub threshold: f64,
    pub target: f64,
    pub min_messages_before_summary: usize,
    pub min_recent_messages: usize,
    pub recent_budget_ratio: f64,
    pub max_load_without_checkpoint: usize,
}

impl Default for SummaryBufferConfig {
    fn default() -> Self {
        Self::from(&WorkingMemoryConfig::default())
    }
}

impl From<&WorkingMemoryConfig> for SummaryBufferConfig {
    fn from(config: &WorkingMemoryConfig) -> Self {
        Self {
            budget: config.budget,
            threshold: config.threshold,
            target: config.target,
            min_messages_before_summary: config.min_messages_before_summary,
            min_recent_messages: config.min_recent_messages,
            recent_budget_ratio: config.recent_budget_ratio,
            max_load_without_checkpoint: config.max_load_without_checkpoint,
        }
    }
}

impl SummaryBufferConfig {
    fn trigger_tokens(&self) -> usize {
        (self.budget as f64 * self.threshold) as usize
    }

    fn recent_budget(&self) -> usize {
        (self.budget as f64 * self.target * self.recent_budget_ratio) as usize
    }
}

pub struct SummaryBuffer {
    config: SummaryBufferConfig,
    counter: TokenCounter,
    summarizer: Arc<dyn Summarizer>,
}

impl std::fmt::Debug for SummaryBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryBuffer")
            .field("config", &self.config)
            .field("counter", &self.counter)
            .finish_non_exhaustive()
    }
}

fn notify(status: Option<&StatusNotifier>, text: &str) {
    if let Some(status) = status {
        status(text);
    }
}

impl SummaryBuffer {
    pub fn new(
        config: SummaryBufferConfig,
        counter: TokenCounter,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            config,
            counter,
            summarizer,
        }
    }

    pub fn config(&self) -> &SummaryBufferConfig {
        &self.config
    }

    /// Whether the window is long enough and heavy enough to compact.
    pub fn should_summarize(&self, window: &ConversationWindow) -> bool {
        if window.len() < self.config.min_messages_before_summary {
            return false;
        }
        let tokens = self.counter.count_messages(window.messages());
        let trigger = self.config.trigger_tokens();
        debug!(
            session_id = %window.session_id,
            tokens,
            trigger,
            messages = window.len(),
            "summary buffer token check"
        );
        tokens > trigger
    }

    /// Folds old history into a checkpoint.
    ///
    /// Returns the messages to persist: the checkpoint, or nothing when
    /// there is no old history. On summarizer failure the window is left
    /// exactly as it was.
    pub async fn summarize(
        &self,
        window: &mut ConversationWindow,
        status: Option<&StatusNotifier>,
    ) -> Result<Vec<Message>, ChronicleError> {
        let split = split_point(
            window.messages(),
            &self.counter,
            self.config.recent_budget(),
            self.config.min_recent_messages,
        );
        if split == 0 {
            return Ok(Vec::new());
        }
        let old = &window.messages()[..split];
        if old.iter().all(Message::is_checkpoint) {
            return Ok(Vec::new());
        }

        notify(status, "summarizing conversation history...");
        let summary = match self.summarizer.summarize(old).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(
                    session_id = %window.session_id,
                    error = %e,
                    "summarization failed, keeping full history"
                );
                notify(status, "summarization failed, continuing with full history");
                return Err(ChronicleError::compaction("summarizer call failed", e));
            }
        };

        let Some(checkpoint) = build_checkpoint(&summary, old) else {
            return Ok(Vec::new());
        };
        let compacted = old.len();
        window.compact(split, checkpoint.clone());
        info!(
            session_id = %window.session_id,
            compacted,
            kept = window.len() - 1,
            "compaction checkpoint created"
        );
        notify(status, "conversation summarized");
        Ok(vec![checkpoint])
    }

    pub async fn check_and_summarize(
        &self,
        window: &mut ConversationWindow,
        status: Option<&StatusNotifier>,
    ) -> Result<Vec<Message>, ChronicleError> {
        if !self.should_summarize(window) {
            return Ok(Vec::new());
        }
        self.summarize(window, status).await
    }

    /// The whole window: compaction already keeps it within budget.
    pub fn get_messages(&self, window: &ConversationWindow) -> Vec<Message> {
        window.messages().to_vec()
    }

    /// Checkpoint-aware reload.
    ///
    /// With a checkpoint, only messages after the last compacted one are
    /// read, giving `[checkpoint] + messages since`. Without one, the load
    /// is capped at the newest `max_load_without_checkpoint` messages.
    pub async fn load_state(
        &self,
        store: &dyn SessionStore,
        agent_id: &str,
        session_id: &str,
    ) -> Result<ConversationWindow, ChronicleError> {
        let checkpoint = store.last_checkpoint(agent_id, session_id).await?;
        let Some(checkpoint) = checkpoint else {
            let cap = self.config.max_load_without_checkpoint;
            let messages = store
                .load_messages(agent_id, session_id, &LoadOptions::last(cap))
                .await?;
            debug!(
                session_id,
                loaded = messages.len(),
                cap,
                "no checkpoint found, loaded most recent messages"
            );
            return Ok(ConversationWindow::new(session_id, messages));
        };

        let options = match checkpoint.resume_after() {
            Some(resume_after) => LoadOptions::after(resume_after).without_checkpoints(),
            // Checkpoints without a resume point predate the marker; fall
            // back to the capped load and drop anything older than them.
            None => LoadOptions::last(self.config.max_load_without_checkpoint),
        };
        let mut since = store.load_messages(agent_id, session_id, &options).await?;
        if checkpoint.resume_after().is_none()
            && let Some(pos) = since.iter().rposition(|m| m.id == checkpoint.id)
        {
            since.drain(..=pos);
        }

        debug!(
            session_id,
            checkpoint_id = %checkpoint.id,
            loaded = since.len(),
            "reloaded from checkpoint"
        );
        let mut messages = Vec::with_capacity(since.len() + 1);
        messages.push(checkpoint);
        messages.extend(since);
        Ok(ConversationWindow::new(session_id, messages))
    }
}
