// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Chronicle integration tests.
//!
//! Provides scripted capability doubles and a temp-file store harness for
//! fast, deterministic tests without external services.
//!
//! # Components
//!
//! - [`MockSummarizer`] - summarizer with scripted results and call counting
//! - [`HashEmbedder`] - deterministic bag-of-words embedder
//! - [`MemoryVectorStore`] - in-process vector store with injectable failures
//! - [`TestStore`] - SQLite session store in a temporary directory

pub mod harness;
pub mod mock_embedder;
pub mod mock_summarizer;
pub mod mock_vector_store;

pub use harness::{TestStore, conversation};
pub use mock_embedder::HashEmbedder;
pub use mock_summarizer::MockSummarizer;
pub use mock_vector_store::MemoryVectorStore;
