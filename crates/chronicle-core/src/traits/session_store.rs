// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session store trait: the durable source of truth for message history.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ChronicleError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{LoadOptions, Message, SessionMetadata};

/// Durable, ordered, per-(agent, session) message log.
///
/// Every read filters by `agent_id`, so two agents sharing a session id
/// never observe each other's messages.
#[async_trait]
pub trait SessionStore: PluginAdapter {
    /// Idempotent get-or-create. Existing metadata is returned unchanged.
    async fn ensure_session(
        &self,
        agent_id: &str,
        session_id: &str,
    ) -> Result<SessionMetadata, ChronicleError>;

    /// Appends all messages in one transaction, assigning the next sequence
    /// numbers inside it. An empty slice is a no-op.
    ///
    /// A cancellation observed before commit rolls the transaction back and
    /// returns [`ChronicleError::Cancelled`].
    async fn append_messages(
        &self,
        agent_id: &str,
        session_id: &str,
        messages: &[Message],
        cancel: &CancellationToken,
    ) -> Result<(), ChronicleError>;

    /// Loads messages in sequence order, narrowed by `options`.
    async fn load_messages(
        &self,
        agent_id: &str,
        session_id: &str,
        options: &LoadOptions,
    ) -> Result<Vec<Message>, ChronicleError>;

    /// Returns the newest summary checkpoint of a session, if any.
    async fn last_checkpoint(
        &self,
        agent_id: &str,
        session_id: &str,
    ) -> Result<Option<Message>, ChronicleError>;

    async fn count_messages(&self, agent_id: &str, session_id: &str)
    -> Result<u64, ChronicleError>;

    /// Deletes a session together with all of its messages.
    async fn delete_session(&self, agent_id: &str, session_id: &str)
    -> Result<(), ChronicleError>;

    /// Lists the sessions of an agent, most recently updated first.
    async fn list_sessions(&self, agent_id: &str) -> Result<Vec<SessionMetadata>, ChronicleError>;

    /// Flushes pending writes and releases the connection.
    async fn close(&self) -> Result<(), ChronicleError>;
}
