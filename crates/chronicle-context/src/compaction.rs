// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compaction: choosing which history to summarize and building the
//! checkpoint message that replaces it.

use chronicle_core::types::{CHECKPOINT_KEY, RESUME_AFTER_KEY};
use chronicle_core::{CHECKPOINT_PREFIX, Message, Role, TokenCounter};
use chrono::Utc;
use serde_json::json;

/// Value of the `type` metadata key on checkpoints.
pub const CHECKPOINT_TYPE: &str = "compaction_summary";

/// Returns the index where the recent suffix starts.
///
/// Scans from the newest message backwards, keeping messages while their
/// running total fits `recent_budget`, and stops at the first one that does
/// not. A suffix shorter than `min_recent` is widened to the last
/// `min_recent` messages regardless of cost. Checkpoints never stay in the
/// suffix; a checkpoint inside it moves the split past it.
pub fn split_point(
    messages: &[Message],
    counter: &TokenCounter,
    recent_budget: usize,
    min_recent: usize,
) -> usize {
    let mut kept = 0;
    let mut total = 0;
    for message in messages.iter().rev() {
        let cost = counter.count_message(message);
        if total + cost > recent_budget {
            break;
        }
        total += cost;
        kept += 1;
    }
    if kept < min_recent {
        kept = min_recent.min(messages.len());
    }

    let split = messages.len() - kept;
    match messages[split..].iter().rposition(Message::is_checkpoint) {
        Some(pos) => split + pos + 1,
        None => split,
    }
}

/// Builds the checkpoint that stands in for `old`.
///
/// Returns `None` when `old` holds no regular messages, since there is
/// nothing new to fold into a summary.
pub fn build_checkpoint(summary: &str, old: &[Message]) -> Option<Message> {
    let last_compacted = old.iter().rev().find(|m| !m.is_checkpoint())?;
    let previously_compacted: u64 = old
        .iter()
        .filter(|m| m.is_checkpoint())
        .filter_map(|m| m.metadata.get("compacted_count").and_then(|v| v.as_u64()))
        .sum();
    let newly_compacted = old.iter().filter(|m| !m.is_checkpoint()).count() as u64;

    let checkpoint = Message::new(Role::System, format!("{CHECKPOINT_PREFIX}{summary}"))
        .with_metadata(CHECKPOINT_KEY, json!(true))
        .with_metadata("type", json!(CHECKPOINT_TYPE))
        .with_metadata(RESUME_AFTER_KEY, json!(last_compacted.id))
        .with_metadata(
            "compacted_count",
            json!(previously_compacted + newly_compacted),
        )
        .with_metadata("compacted_at", json!(Utc::now().to_rfc3339()));
    Some(checkpoint)
}
