// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted summarizer for deterministic compaction tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chronicle_core::{ChronicleError, Message, Summarizer};

/// A summarizer that returns queued results.
///
/// Results are popped from a FIFO queue. When the queue is empty, a
/// default `"summary of N messages"` text is returned.
#[derive(Default)]
pub struct MockSummarizer {
    script: Mutex<VecDeque<Result<String, String>>>,
    calls: AtomicUsize,
    last_input_len: Mutex<Option<usize>>,
    delay: Option<Duration>,
}

impl MockSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps this long inside every call, to widen race windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_summary(&self, text: &str) {
        self.script
            .lock()
            .expect("mock summarizer lock poisoned")
            .push_back(Ok(text.to_string()));
    }

    /// Makes the next call fail with a provider error.
    pub fn fail_next(&self, reason: &str) {
        self.script
            .lock()
            .expect("mock summarizer lock poisoned")
            .push_back(Err(reason.to_string()));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of messages passed to the most recent call.
    pub fn last_input_len(&self) -> Option<usize> {
        *self
            .last_input_len
            .lock()
            .expect("mock summarizer lock poisoned")
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, messages: &[Message]) -> Result<String, ChronicleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_input_len
            .lock()
            .expect("mock summarizer lock poisoned") = Some(messages.len());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .script
            .lock()
            .expect("mock summarizer lock poisoned")
            .pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => Err(ChronicleError::Provider {
                message: reason,
                source: None,
            }),
            None => Ok(format!("summary of {} messages", messages.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_results_then_default() {
        let mock = MockSummarizer::new();
        mock.push_summary("first");
        mock.fail_next("down");

        let input = vec![Message::user("a"), Message::user("b")];
        assert_eq!(mock.summarize(&input).await.unwrap(), "first");
        assert!(mock.summarize(&input).await.is_err());
        assert_eq!(
            mock.summarize(&input).await.unwrap(),
            "summary of 2 messages"
        );
        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.last_input_len(), Some(2));
    }
}
