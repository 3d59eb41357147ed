// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector index backend trait.

use async_trait::async_trait;

use crate::error::ChronicleError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{MetadataFilter, VectorDocument, VectorHit};

/// Vector index keyed by collection name, document id, and metadata.
///
/// Filters match documents whose metadata holds every pair as a string value.
#[async_trait]
pub trait VectorStore: PluginAdapter {
    /// Inserts or replaces a document.
    async fn upsert(&self, collection: &str, document: VectorDocument)
    -> Result<(), ChronicleError>;

    /// Returns up to `limit` hits ordered by descending similarity.
    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<VectorHit>, ChronicleError>;

    /// Deletes every document matching the filter. Returns the number removed.
    async fn delete_by_filter(
        &self,
        collection: &str,
        filter: &MetadataFilter,
    ) -> Result<u64, ChronicleError>;
}
