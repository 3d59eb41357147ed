// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model-aware token counting for working-memory budgets.
//!
//! Counts follow the chat-format accounting used by OpenAI-style models: each
//! message costs a fixed overhead plus its role and content tokens, and a
//! non-empty conversation adds the reply priming tokens once.

use std::fmt;
use std::sync::Arc;

use tiktoken_rs::CoreBPE;

use crate::types::{Message, Part};

/// Fixed per-message framing cost.
pub const MESSAGE_OVERHEAD: usize = 3;

/// Tokens priming the assistant reply, counted once per conversation.
pub const REPLY_PRIMING: usize = 3;

/// Counts tokens for messages and raw text.
#[derive(Clone)]
pub enum TokenCounter {
    /// Exact BPE counts from the model's tokenizer.
    Tiktoken(Arc<CoreBPE>),
    /// Characters divided by four, rounded up.
    Estimate,
}

impl fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tiktoken(_) => f.write_str("TokenCounter::Tiktoken"),
            Self::Estimate => f.write_str("TokenCounter::Estimate"),
        }
    }
}

impl TokenCounter {
    /// Builds a counter for the named model.
    ///
    /// Unknown models use the cl100k encoding; if no encoding can be loaded
    /// the character estimate is used.
    pub fn for_model(model: &str) -> Self {
        match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => Self::Tiktoken(Arc::new(bpe)),
            Err(_) => match tiktoken_rs::cl100k_base() {
                Ok(bpe) => {
                    tracing::debug!(model, "unknown model, counting tokens with cl100k_base");
                    Self::Tiktoken(Arc::new(bpe))
                }
                Err(e) => {
                    tracing::warn!(model, error = %e, "no tokenizer available, estimating tokens");
                    Self::Estimate
                }
            },
        }
    }

    pub fn estimate() -> Self {
        Self::Estimate
    }

    /// Tokens in a raw string.
    pub fn count_text(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match self {
            Self::Tiktoken(bpe) => bpe.encode_with_special_tokens(text).len(),
            Self::Estimate => text.chars().count().div_ceil(4),
        }
    }

    /// Tokens of one message including framing overhead.
    pub fn count_message(&self, message: &Message) -> usize {
        let mut total = MESSAGE_OVERHEAD + self.count_text(&message.role.to_string());
        for part in &message.parts {
            total += match part {
                Part::Text { text } => self.count_text(text),
                Part::Data { data, .. } => self.count_text(&data.to_string()),
            };
        }
        total
    }

    /// Tokens of a whole conversation. Empty input costs nothing.
    pub fn count_messages(&self, messages: &[Message]) -> usize {
        if messages.is_empty() {
            return 0;
        }
        messages
            .iter()
            .map(|m| self.count_message(m))
            .sum::<usize>()
            + REPLY_PRIMING
    }
}
