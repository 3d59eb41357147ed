// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The memory service: one orchestrator shared by every caller.
//!
//! Writes go to the session store first. Long-term indexing and compaction
//! run afterwards and degrade to log lines when they fail, so a turn is never
//! lost because a summarizer or embedder is down.

use std::sync::{Arc, RwLock};

use chronicle_config::model::LongTermConfig;
use chronicle_context::WorkingMemory;
use chronicle_core::{
    CancellationToken, ChronicleError, LoadOptions, Message, Role, SessionStore, StatusNotifier,
    cancellable,
};
use chronicle_memory::LongTermMemory;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::pending::{PendingBatch, PendingBuffers};

/// Session id used when a caller passes an empty one.
pub const DEFAULT_SESSION_ID: &str = "default";

fn session_key(session_id: &str) -> &str {
    let trimmed = session_id.trim();
    if trimmed.is_empty() {
        DEFAULT_SESSION_ID
    } else {
        trimmed
    }
}

/// Conversation memory for one agent.
///
/// Shared as `Arc<MemoryService>`. There is no global lock: sequence numbers
/// are allocated by the store's write transaction, compaction is serialized
/// per session, and the long-term buffer has its own short-lived mutex.
pub struct MemoryService {
    agent_id: String,
    store: Arc<dyn SessionStore>,
    working_memory: WorkingMemory,
    long_term: Option<LongTermMemory>,
    long_term_config: LongTermConfig,
    pending: PendingBuffers,
    compaction_locks: DashMap<String, Arc<Mutex<()>>>,
    notifier: RwLock<Option<StatusNotifier>>,
}

impl MemoryService {
    pub fn new(
        agent_id: impl Into<String>,
        store: Arc<dyn SessionStore>,
        working_memory: WorkingMemory,
        long_term: Option<LongTermMemory>,
        long_term_config: LongTermConfig,
    ) -> Self {
        let pending = PendingBuffers::new(
            long_term_config.batch_size,
            long_term_config.max_flush_attempts,
        );
        Self {
            agent_id: agent_id.into(),
            store,
            working_memory,
            long_term,
            long_term_config,
            pending,
            compaction_locks: DashMap::new(),
            notifier: RwLock::new(None),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// The underlying session store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn working_memory(&self) -> &WorkingMemory {
        &self.working_memory
    }

    pub fn long_term(&self) -> Option<&LongTermMemory> {
        self.long_term.as_ref()
    }

    /// Installs a progress callback for long-running steps such as
    /// summarization. Replaces any previous callback.
    pub fn set_status_notifier(&self, notifier: StatusNotifier) {
        let mut slot = self.notifier.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(notifier);
    }

    fn notifier(&self) -> Option<StatusNotifier> {
        self.notifier
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn compaction_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.compaction_locks
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// Forgets a session's lock once no caller holds or waits on it.
    fn release_compaction_lock(&self, session_id: &str) {
        self.compaction_locks
            .remove_if(session_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    fn auto_recall(&self) -> bool {
        self.long_term.is_some() && self.long_term_config.effective_auto_recall()
    }

    /// Persists a batch of messages for a session.
    ///
    /// The batch is appended atomically. Afterwards the session is checked
    /// for compaction exactly once, however many messages the batch holds.
    /// Only persistence errors and cancellation are returned.
    pub async fn add_batch(
        &self,
        session_id: &str,
        messages: Vec<Message>,
        cancel: &CancellationToken,
    ) -> Result<(), ChronicleError> {
        let session_id = session_key(session_id);
        if messages.is_empty() {
            return Ok(());
        }

        self.store
            .append_messages(&self.agent_id, session_id, &messages, cancel)
            .await?;
        debug!(session_id, count = messages.len(), "batch appended");

        self.enqueue_long_term(session_id, messages).await;
        self.compact(session_id, cancel).await
    }

    async fn compact(
        &self,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ChronicleError> {
        let lock = self.compaction_lock(session_id);
        let result = {
            let _guard = lock.lock().await;
            self.compact_locked(session_id, cancel).await
        };
        drop(lock);
        self.release_compaction_lock(session_id);
        result
    }

    async fn compact_locked(
        &self,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ChronicleError> {
        let mut window = self
            .working_memory
            .load_state(self.store.as_ref(), &self.agent_id, session_id)
            .await?;
        let notifier = self.notifier();
        let checkpoints = match self
            .working_memory
            .check_and_summarize(&mut window, notifier.as_ref())
            .await
        {
            Ok(checkpoints) => checkpoints,
            Err(e) => {
                warn!(session_id, error = %e, "compaction failed, keeping full history");
                return Ok(());
            }
        };
        if checkpoints.is_empty() {
            return Ok(());
        }

        if let Err(e) = self
            .store
            .append_messages(&self.agent_id, session_id, &checkpoints, cancel)
            .await
        {
            warn!(session_id, error = %e, "failed to persist checkpoint");
            return Ok(());
        }
        info!(
            session_id,
            window = window.len(),
            "conversation compacted"
        );
        self.enqueue_long_term(session_id, checkpoints).await;
        Ok(())
    }

    async fn enqueue_long_term(&self, session_id: &str, messages: Vec<Message>) {
        if self.long_term.is_none() {
            return;
        }
        let scope = self.long_term_config.storage_scope;
        let admitted: Vec<Message> = messages.into_iter().filter(|m| scope.admits(m)).collect();
        if admitted.is_empty() && self.pending.pending_len(session_id).await == 0 {
            return;
        }
        if let Some(batch) = self.pending.enqueue(session_id, admitted).await {
            self.flush(session_id, batch).await;
        }
    }

    /// Writes one batch to long-term memory, re-queueing it on failure.
    async fn flush(&self, session_id: &str, batch: PendingBatch) -> bool {
        let Some(long_term) = &self.long_term else {
            return true;
        };
        match long_term
            .store(&self.agent_id, session_id, &batch.messages)
            .await
        {
            Ok(stored) => {
                debug!(session_id, stored, "long-term batch flushed");
                true
            }
            Err(e) => {
                warn!(
                    session_id,
                    count = batch.len(),
                    attempt = batch.attempts + 1,
                    error = %e,
                    "long-term flush failed"
                );
                self.pending.requeue(session_id, batch).await;
                false
            }
        }
    }

    /// Returns the history to show the model for a session.
    ///
    /// With auto-recall on, messages recalled from long-term memory for the
    /// newest user message are placed in front. Recall failures are logged
    /// and the plain history is returned.
    pub async fn get_recent_history(
        &self,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Message>, ChronicleError> {
        let session_id = session_key(session_id);
        cancellable(cancel, async {
            let window = self
                .working_memory
                .load_state(self.store.as_ref(), &self.agent_id, session_id)
                .await?;
            let messages = self.working_memory.get_messages(&window);
            if !self.auto_recall() {
                return Ok(messages);
            }
            let recalled = self.recall_for(session_id, &messages).await;
            if recalled.is_empty() {
                return Ok(messages);
            }
            debug!(session_id, recalled = recalled.len(), "prepending recalled messages");
            let mut history = recalled;
            history.extend(messages);
            Ok(history)
        })
        .await
    }

    async fn recall_for(&self, session_id: &str, history: &[Message]) -> Vec<Message> {
        let Some(long_term) = &self.long_term else {
            return Vec::new();
        };
        let Some(query) = history
            .iter()
            .rev()
            .find(|m| m.role == Role::User && !m.is_checkpoint())
            .map(Message::text)
        else {
            return Vec::new();
        };
        match long_term
            .recall(
                &self.agent_id,
                session_id,
                &query,
                self.long_term_config.recall_limit,
            )
            .await
        {
            Ok(recalled) => recalled
                .into_iter()
                .filter(|r| history.iter().all(|m| m.id != r.id))
                .collect(),
            Err(e) => {
                warn!(session_id, error = %e, "recall failed, continuing without it");
                Vec::new()
            }
        }
    }

    /// Deletes a session's history.
    ///
    /// Pending long-term messages are flushed first. With `clear_on_delete`
    /// the session's long-term entries are removed as well.
    pub async fn clear_history(
        &self,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ChronicleError> {
        let session_id = session_key(session_id);
        if cancel.is_cancelled() {
            return Err(ChronicleError::Cancelled);
        }
        if let Some(batch) = self.pending.take(session_id).await
            && !self.flush(session_id, batch).await
        {
            warn!(session_id, "pending long-term batch not flushed before clear");
        }

        let lock = self.compaction_lock(session_id);
        let deleted = {
            let _guard = lock.lock().await;
            self.store.delete_session(&self.agent_id, session_id).await
        };
        drop(lock);
        self.release_compaction_lock(session_id);
        deleted?;
        self.pending.discard(session_id).await;

        if self.long_term_config.clear_on_delete
            && let Some(long_term) = &self.long_term
        {
            match long_term.clear(&self.agent_id, session_id).await {
                Ok(removed) => debug!(session_id, removed, "long-term entries cleared"),
                Err(e) => warn!(session_id, error = %e, "failed to clear long-term entries"),
            }
        }
        info!(session_id, "session history cleared");
        Ok(())
    }

    /// Replays a session's stored history into long-term memory. Returns the
    /// number of messages indexed.
    pub async fn rebuild_long_term(
        &self,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> Result<usize, ChronicleError> {
        let session_id = session_key(session_id);
        let Some(long_term) = &self.long_term else {
            return Err(ChronicleError::Config(
                "long-term memory is not enabled".into(),
            ));
        };
        cancellable(cancel, async {
            let messages = self
                .store
                .load_messages(&self.agent_id, session_id, &LoadOptions::default())
                .await?;
            let scope = self.long_term_config.storage_scope;
            let admitted: Vec<Message> =
                messages.into_iter().filter(|m| scope.admits(m)).collect();
            long_term.clear(&self.agent_id, session_id).await?;
            let stored = long_term
                .store(&self.agent_id, session_id, &admitted)
                .await?;
            info!(session_id, stored, "long-term index rebuilt");
            Ok(stored)
        })
        .await
    }

    /// Flushes every pending long-term batch. Safe to call concurrently and
    /// repeatedly; each batch is flushed by exactly one caller.
    ///
    /// Returns a long-term error when any batch could not be stored. Failed
    /// batches stay queued, so a later call retries them.
    pub async fn shutdown(&self) -> Result<(), ChronicleError> {
        let batches = self.pending.take_all().await;
        if batches.is_empty() {
            debug!("no pending long-term batches at shutdown");
            return Ok(());
        }
        let total = batches.len();
        let mut failed = 0;
        for (session_id, batch) in batches {
            if !self.flush(&session_id, batch).await {
                failed += 1;
            }
        }
        info!(batches = total, failed, "pending long-term batches flushed");
        if failed > 0 {
            return Err(ChronicleError::long_term(
                format!("{failed} of {total} pending long-term batches failed to flush"),
                None,
            ));
        }
        Ok(())
    }
}
