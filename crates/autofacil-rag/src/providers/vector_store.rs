//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use crate::error::Result;
use crate::types::{Chunk, SourceSummary};

/// Search result from vector store
#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    /// The matched chunk
    pub chunk: Chunk,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub similarity: f32,
}

/// Trait for vector storage and similarity search
///
/// Records are keyed by their `source` metadata for deletion: at most one
/// generation of chunks exists per source.
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Insert embedded chunks
    async fn insert_chunks(&self, chunks: &[Chunk]) -> Result<()>;

    /// Delete all chunks tagged with `source`. Idempotent.
    async fn delete_by_source(&self, source: &str) -> Result<usize>;

    /// Replace every chunk of `source` with `chunks`, returning how many
    /// old chunks were removed.
    ///
    /// The default implementation is a plain delete followed by an insert;
    /// a failure in between leaves the source without chunks. Backends
    /// with transactions should override it.
    async fn replace_source(&self, source: &str, chunks: &[Chunk]) -> Result<usize> {
        let deleted = self.delete_by_source(source).await?;
        self.insert_chunks(chunks).await?;
        Ok(deleted)
    }

    /// Search for the `top_k` most similar chunks, optionally restricted to one source
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        source_filter: Option<&str>,
    ) -> Result<Vec<VectorSearchResult>>;

    /// Number of chunks stored for a source
    async fn count_by_source(&self, source: &str) -> Result<usize>;

    /// Every indexed source with its chunk count
    async fn list_sources(&self) -> Result<Vec<SourceSummary>>;

    /// Get total number of vectors stored
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
