use async_trait::async_trait;

use crate::entities::EmbeddingRow;
use crate::error::Result;
use crate::value_objects::{ChildChunkId, DocumentKey};

/// Embedding counts for a document, split by chunk identification.
///
/// Rows written before chunk tracking existed have no `child_chunk` value;
/// the reprocess planner uses the split to decide whether selective cleanup
/// is possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmbeddingCounts {
    /// All rows for the document
    pub total: u64,
    /// Rows that carry a `child_chunk` value
    pub with_child_chunk: u64,
}

/// Vector Store Gateway
///
/// Persists embedding rows and supports the cleanup operations the
/// reprocess planner needs. The gateway is model-agnostic: vectors are
/// opaque float arrays whose length is fixed by the embedding model.
///
/// Each `insert` is atomic and durable on return; the worker relies on
/// this per-micro-chunk commit granularity so that a mid-chunk failure
/// never leaves a partially visible row and retries stay cheap.
#[async_trait]
pub trait VectorStoreGateway: Send + Sync {
    /// Create the embeddings table and its `(src, child_chunk)` index if
    /// absent. Idempotent; fails only on unrecoverable connectivity errors.
    ///
    /// # Returns
    /// Ok(()) once the schema is known to exist
    async fn ensure_schema(&self) -> Result<()>;

    /// Append a single embedding row.
    ///
    /// # Arguments
    /// * `row` - the row to persist
    ///
    /// # Returns
    /// Ok(()) once the row is durable
    async fn insert(&self, row: EmbeddingRow) -> Result<()>;

    /// Remove all rows for a document. Used by full cleanup.
    ///
    /// # Returns
    /// Ok(count) of rows removed
    async fn delete_by_src(&self, src: &DocumentKey) -> Result<u64>;

    /// Remove rows for specific child chunks of a document. Used by
    /// selective reprocess.
    ///
    /// # Returns
    /// Ok(count) of rows removed
    async fn delete_by_src_and_child_chunks(
        &self,
        src: &DocumentKey,
        chunks: &[ChildChunkId],
    ) -> Result<u64>;

    /// Count rows for a document, split by chunk identification.
    async fn count_embeddings(&self, src: &DocumentKey) -> Result<EmbeddingCounts>;

    /// Get the name/identifier of this gateway implementation
    ///
    /// # Returns
    /// A string identifier for the backend (e.g. "postgres", "memory")
    fn provider_name(&self) -> &str;

    /// Health check for the gateway (default implementation)
    async fn health_check(&self) -> Result<()> {
        self.ensure_schema().await
    }
}
