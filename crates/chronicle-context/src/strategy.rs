// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The working-memory capability, dispatched over a closed set of strategies.

use std::sync::Arc;

use chronicle_config::model::{StrategyKind, WorkingMemoryConfig};
use chronicle_core::{
    ChronicleError, Message, SessionStore, StatusNotifier, Summarizer, TokenCounter,
};

use crate::buffer_window::BufferWindow;
use crate::summary_buffer::{SummaryBuffer, SummaryBufferConfig};
use crate::window::ConversationWindow;

/// Decides which part of a session's history is exposed to the model.
#[derive(Debug)]
pub enum WorkingMemory {
    BufferWindow(BufferWindow),
    SummaryBuffer(SummaryBuffer),
}

impl WorkingMemory {
    /// Builds the configured strategy. The summary buffer needs a summarizer.
    pub fn from_config(
        config: &WorkingMemoryConfig,
        summarizer: Option<Arc<dyn Summarizer>>,
    ) -> Result<Self, ChronicleError> {
        match config.strategy {
            StrategyKind::BufferWindow => Ok(Self::BufferWindow(BufferWindow::new(
                config.window_size,
            ))),
            StrategyKind::SummaryBuffer => {
                let summarizer = summarizer.ok_or_else(|| {
                    ChronicleError::Config(
                        "working_memory.strategy = \"summary_buffer\" requires a summarizer"
                            .into(),
                    )
                })?;
                Ok(Self::SummaryBuffer(SummaryBuffer::new(
                    SummaryBufferConfig::from(config),
                    TokenCounter::for_model(&config.model),
                    summarizer,
                )))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::BufferWindow(_) => "buffer_window",
            Self::SummaryBuffer(_) => "summary_buffer",
        }
    }

    pub fn add_message(&self, window: &mut ConversationWindow, message: Message) {
        window.push(message);
    }

    /// Runs one compaction check. Returns the messages that must be
    /// persisted (a checkpoint, or nothing).
    pub async fn check_and_summarize(
        &self,
        window: &mut ConversationWindow,
        status: Option<&StatusNotifier>,
    ) -> Result<Vec<Message>, ChronicleError> {
        match self {
            Self::BufferWindow(_) => Ok(Vec::new()),
            Self::SummaryBuffer(s) => s.check_and_summarize(window, status).await,
        }
    }

    pub fn get_messages(&self, window: &ConversationWindow) -> Vec<Message> {
        match self {
            Self::BufferWindow(s) => s.get_messages(window),
            Self::SummaryBuffer(s) => s.get_messages(window),
        }
    }

    pub async fn load_state(
        &self,
        store: &dyn SessionStore,
        agent_id: &str,
        session_id: &str,
    ) -> Result<ConversationWindow, ChronicleError> {
        match self {
            Self::BufferWindow(s) => s.load_state(store, agent_id, session_id).await,
            Self::SummaryBuffer(s) => s.load_state(store, agent_id, session_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_test_utils::MockSummarizer;

    #[test]
    fn builds_buffer_window_without_summarizer() {
        let config = WorkingMemoryConfig {
            strategy: StrategyKind::BufferWindow,
            window_size: 3,
            ..WorkingMemoryConfig::default()
        };
        let wm = WorkingMemory::from_config(&config, None).unwrap();
        assert_eq!(wm.name(), "buffer_window");
    }

    #[test]
    fn summary_buffer_requires_summarizer() {
        let config = WorkingMemoryConfig::default();
        let err = WorkingMemory::from_config(&config, None).unwrap_err();
        assert!(matches!(err, ChronicleError::Config(_)));

        let wm = WorkingMemory::from_config(&config, Some(Arc::new(MockSummarizer::new())))
            .unwrap();
        assert_eq!(wm.name(), "summary_buffer");
    }

    #[tokio::test]
    async fn buffer_window_check_never_compacts() {
        let wm = WorkingMemory::BufferWindow(BufferWindow::new(2));
        let mut window = ConversationWindow::new("s", Vec::new());
        for i in 0..50 {
            wm.add_message(&mut window, Message::user(format!("m{i}")));
        }
        let persisted = wm.check_and_summarize(&mut window, None).await.unwrap();
        assert!(persisted.is_empty());
        assert_eq!(window.len(), 50);
        assert_eq!(wm.get_messages(&window).len(), 2);
    }
}
