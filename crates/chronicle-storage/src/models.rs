// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row-level models returned by the query modules.

use chronicle_core::Message;

/// A persisted message together with its store-assigned position.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    /// 1-based, gapless position within the session.
    pub sequence_num: i64,
    pub message: Message,
}

/// Result of a transactional append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Rows committed; holds the first and last sequence numbers written.
    Committed { first: i64, last: i64 },
    /// The cancellation token fired before commit; nothing was written.
    RolledBack,
}
