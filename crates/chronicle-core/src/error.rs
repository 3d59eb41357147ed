// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Chronicle memory runtime.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across all Chronicle traits and core operations.
#[derive(Debug, Error)]
pub enum ChronicleError {
    /// Caller errors rejected before any I/O (empty identifiers, malformed messages).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Session store errors (database connection, transaction failure, serialization).
    #[error("storage error: {source}")]
    Storage { source: BoxError },

    /// External capability errors (summarizer model call, embedding generation).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<BoxError>,
    },

    /// Summarization of old history failed. The window is left untouched.
    #[error("compaction failed: {message}")]
    Compaction {
        message: String,
        source: Option<BoxError>,
    },

    /// Long-term recall failed (embedder or vector search).
    #[error("recall failed: {message}")]
    Recall {
        message: String,
        source: Option<BoxError>,
    },

    /// Long-term indexing or clearing failed.
    #[error("long-term memory error: {message}")]
    LongTerm {
        message: String,
        source: Option<BoxError>,
    },

    /// Adapter health check failed.
    #[error("health check failed for {name}: {source}")]
    HealthCheckFailed { name: String, source: BoxError },

    /// The caller's cancellation token fired before the operation completed.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChronicleError {
    /// Wraps any error as a storage failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(err),
        }
    }

    pub fn compaction(message: impl Into<String>, source: ChronicleError) -> Self {
        Self::Compaction {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn recall(message: impl Into<String>, source: ChronicleError) -> Self {
        Self::Recall {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn long_term(message: impl Into<String>, source: Option<ChronicleError>) -> Self {
        Self::LongTerm {
            message: message.into(),
            source: source.map(|e| Box::new(e) as BoxError),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
