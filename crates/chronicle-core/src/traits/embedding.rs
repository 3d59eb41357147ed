// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::ChronicleError;

/// Converts text into a vector representation for semantic recall.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ChronicleError>;

    /// Dimensionality of the produced vectors.
    fn dimensions(&self) -> usize;
}
