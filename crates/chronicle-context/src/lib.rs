// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Working-memory strategies for the Chronicle memory runtime.
//!
//! A strategy decides which subset of a session's persisted history is
//! exposed to generation:
//!
//! - [`BufferWindow`]: the last N messages.
//! - [`SummaryBuffer`]: a token budget kept by folding old messages into
//!   summary checkpoints, with checkpoint-aware reload.

pub mod buffer_window;
pub mod compaction;
pub mod strategy;
pub mod summary_buffer;
pub mod window;

pub use buffer_window::BufferWindow;
pub use strategy::WorkingMemory;
pub use summary_buffer::{SummaryBuffer, SummaryBufferConfig};
pub use window::ConversationWindow;
