// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits consumed by the memory subsystem.
//!
//! Storage backends extend the [`PluginAdapter`] base trait. All traits use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod embedding;
pub mod session_store;
pub mod summarizer;
pub mod vector_store;

pub use adapter::PluginAdapter;
pub use embedding::Embedder;
pub use session_store::SessionStore;
pub use summarizer::Summarizer;
pub use vector_store::VectorStore;
