// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summarizer trait, backed by a language-model client elsewhere.

use async_trait::async_trait;

use crate::error::ChronicleError;
use crate::types::Message;

/// Produces a condensed summary of a run of messages.
///
/// Implementations typically call a language model and may take several
/// seconds. Failures surface as compaction failures, never as data loss.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, messages: &[Message]) -> Result<String, ChronicleError>;
}
