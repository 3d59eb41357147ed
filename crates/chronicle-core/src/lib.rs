// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Chronicle memory runtime.
//!
//! This crate provides the message model, error taxonomy, token counting,
//! and the capability traits (session store, summarizer, embedder, vector
//! store) that the rest of the workspace is written against.

pub mod cancel;
pub mod error;
pub mod tokens;
pub mod traits;
pub mod types;

pub use cancel::cancellable;
pub use error::ChronicleError;
pub use tokens::TokenCounter;
pub use types::{
    AdapterType, HealthStatus, LoadOptions, Message, MetadataFilter, Part, Role,
    SessionMetadata, StatusNotifier, VectorDocument, VectorHit, CHECKPOINT_PREFIX,
};

pub use traits::{Embedder, PluginAdapter, SessionStore, Summarizer, VectorStore};

pub use tokio_util::sync::CancellationToken;
