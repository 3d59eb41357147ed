// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session buffers of messages waiting to be written to long-term memory.
//!
//! One mutex covers append, size check, and take. Flushing happens outside
//! the lock, so a slow index never blocks other sessions' enqueues.

use std::collections::HashMap;

use chronicle_core::Message;
use tokio::sync::Mutex;
use tracing::error;

/// A batch taken out of the buffer for flushing.
#[derive(Debug, Default)]
pub struct PendingBatch {
    pub messages: Vec<Message>,
    /// Failed flush attempts so far.
    pub attempts: u32,
}

impl PendingBatch {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

pub struct PendingBuffers {
    batches: Mutex<HashMap<String, PendingBatch>>,
    batch_size: usize,
    max_attempts: u32,
}

impl PendingBuffers {
    pub fn new(batch_size: usize, max_attempts: u32) -> Self {
        Self {
            batches: Mutex::new(HashMap::new()),
            batch_size: batch_size.max(1),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Appends messages. Returns the whole batch once it reaches the batch
    /// size; the caller owns flushing it.
    pub async fn enqueue(&self, session_id: &str, messages: Vec<Message>) -> Option<PendingBatch> {
        let mut guard = self.batches.lock().await;
        let batch = guard.entry(session_id.to_string()).or_default();
        batch.messages.extend(messages);
        if batch.len() >= self.batch_size {
            guard.remove(session_id)
        } else {
            None
        }
    }

    /// Takes whatever is pending for one session.
    pub async fn take(&self, session_id: &str) -> Option<PendingBatch> {
        self.batches
            .lock()
            .await
            .remove(session_id)
            .filter(|b| !b.is_empty())
    }

    /// Takes every pending batch. Concurrent callers never see the same batch.
    pub async fn take_all(&self) -> Vec<(String, PendingBatch)> {
        self.batches
            .lock()
            .await
            .drain()
            .filter(|(_, b)| !b.is_empty())
            .collect()
    }

    /// Puts a failed batch back in front of anything queued since. Returns
    /// `false` when the batch has used up its attempts and was dropped.
    pub async fn requeue(&self, session_id: &str, mut failed: PendingBatch) -> bool {
        failed.attempts += 1;
        if failed.attempts >= self.max_attempts {
            error!(
                session_id,
                dropped = failed.len(),
                attempts = failed.attempts,
                "long-term flush retries exhausted, dropping batch"
            );
            return false;
        }
        let mut guard = self.batches.lock().await;
        let slot = guard.entry(session_id.to_string()).or_default();
        let newer = std::mem::take(&mut slot.messages);
        failed.messages.extend(newer);
        failed.attempts = failed.attempts.max(slot.attempts);
        *slot = failed;
        true
    }

    /// Drops anything pending for a session without flushing it.
    pub async fn discard(&self, session_id: &str) -> usize {
        self.batches
            .lock()
            .await
            .remove(session_id)
            .map_or(0, |b| b.len())
    }

    pub async fn pending_len(&self, session_id: &str) -> usize {
        self.batches
            .lock()
            .await
            .get(session_id)
            .map_or(0, PendingBatch::len)
    }
}
