use async_trait::async_trait;
use dashmap::DashMap;
use embedflow_domain::entities::EmbeddingRow;
use embedflow_domain::error::Result;
use embedflow_domain::ports::providers::{EmbeddingCounts, VectorStoreGateway};
use embedflow_domain::value_objects::{ChildChunkId, DocumentKey};

/// In-memory vector store gateway.
///
/// Rows are keyed by document; an insert replaces any existing row with the
/// same `(child_chunk, embedding_index)`, which makes reprocessing after
/// cleanup idempotent.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    rows: DashMap<DocumentKey, Vec<EmbeddingRow>>,
}

impl InMemoryVectorStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows for a document, in insertion order. Test support.
    #[must_use]
    pub fn rows_for(&self, src: &DocumentKey) -> Vec<EmbeddingRow> {
        self.rows.get(src).map(|rows| rows.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl VectorStoreGateway for InMemoryVectorStore {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn insert(&self, row: EmbeddingRow) -> Result<()> {
        let mut rows = self.rows.entry(row.src.clone()).or_default();
        if let Some(existing) = rows.iter_mut().find(|candidate| {
            candidate.child_chunk == row.child_chunk
                && candidate.embedding_index == row.embedding_index
        }) {
            *existing = row;
        } else {
            rows.push(row);
        }
        Ok(())
    }

    async fn delete_by_src(&self, src: &DocumentKey) -> Result<u64> {
        let removed = self
            .rows
            .remove(src)
            .map_or(0, |(_, rows)| rows.len() as u64);
        Ok(removed)
    }

    async fn delete_by_src_and_child_chunks(
        &self,
        src: &DocumentKey,
        chunks: &[ChildChunkId],
    ) -> Result<u64> {
        let Some(mut rows) = self.rows.get_mut(src) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !chunks.contains(&row.child_chunk));
        Ok((before - rows.len()) as u64)
    }

    async fn count_embeddings(&self, src: &DocumentKey) -> Result<EmbeddingCounts> {
        let counts = self.rows.get(src).map_or_else(EmbeddingCounts::default, |rows| {
            EmbeddingCounts {
                total: rows.len() as u64,
                with_child_chunk: rows
                    .iter()
                    .filter(|row| !row.child_chunk.as_str().is_empty())
                    .count() as u64,
            }
        });
        Ok(counts)
    }

    fn provider_name(&self) -> &str {
        "memory"
    }
}
