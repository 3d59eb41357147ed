// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory message window for one session.

use chronicle_core::Message;

/// The messages a strategy has loaded for a session, oldest first.
///
/// A window is rebuilt from the session store per operation and never
/// shared between callers, so strategies hold no per-session state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationWindow {
    pub session_id: String,
    messages: Vec<Message>,
}

impl ConversationWindow {
    pub fn new(session_id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            session_id: session_id.into(),
            messages,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replaces everything before `split` with `checkpoint`.
    pub(crate) fn compact(&mut self, split: usize, checkpoint: Message) {
        let recent = self.messages.split_off(split);
        self.messages = std::iter::once(checkpoint).chain(recent).collect();
    }

    /// Whether the window begins with a summary checkpoint.
    pub fn starts_with_checkpoint(&self) -> bool {
        self.messages.first().is_some_and(Message::is_checkpoint)
    }
}
