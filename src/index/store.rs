//! Abstract interface for the persistent context index.

use async_trait::async_trait;

use crate::core::errors::PipelineError;

/// Persistent similarity-searchable store of previously gathered text.
///
/// Documents are content-addressed: storing the same text twice must not
/// create a duplicate entry.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Return the `top_k` most similar document texts for a query, best
    /// first. An empty index yields an empty list, not an error.
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<String>, PipelineError>;

    /// Upsert `(source, text)` documents.
    async fn persist(&self, documents: &[(String, String)]) -> Result<(), PipelineError>;

    /// Number of documents currently indexed.
    async fn count(&self) -> Result<usize, PipelineError>;
}
