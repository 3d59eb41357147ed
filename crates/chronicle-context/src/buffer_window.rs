// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Buffer-window strategy: the last N messages, no token accounting.

use chronicle_core::{ChronicleError, LoadOptions, Message, SessionStore};

use crate::window::ConversationWindow;

pub const DEFAULT_WINDOW_SIZE: usize = 20;

#[derive(Debug, Clone)]
pub struct BufferWindow {
    window_size: usize,
}

impl Default for BufferWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl BufferWindow {
    /// A zero size is treated as one.
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn get_messages(&self, window: &ConversationWindow) -> Vec<Message> {
        let messages = window.messages();
        let start = messages.len().saturating_sub(self.window_size);
        messages[start..].to_vec()
    }

    /// Loads only the rows the window can show.
    pub async fn load_state(
        &self,
        store: &dyn SessionStore,
        agent_id: &str,
        session_id: &str,
    ) -> Result<ConversationWindow, ChronicleError> {
        let messages = store
            .load_messages(agent_id, session_id, &LoadOptions::last(self.window_size))
            .await?;
        Ok(ConversationWindow::new(session_id, messages))
    }
}
