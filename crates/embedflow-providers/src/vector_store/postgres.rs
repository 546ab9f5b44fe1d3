use async_trait::async_trait;
use embedflow_domain::entities::EmbeddingRow;
use embedflow_domain::error::{Error, Result};
use embedflow_domain::ports::providers::{EmbeddingCounts, VectorStoreGateway};
use embedflow_domain::value_objects::{ChildChunkId, DocumentKey};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::info;

/// Postgres vector store gateway.
///
/// Vectors are stored as `real[]`; each insert is a single auto-committed
/// statement, which gives the per-micro-chunk commit granularity the worker
/// relies on. `ON CONFLICT` on the row key makes redelivered work
/// idempotent.
pub struct PostgresVectorStore {
    pool: PgPool,
}

impl PostgresVectorStore {
    /// Connect a pool and wrap it.
    ///
    /// # Errors
    ///
    /// Returns an error when the database is unreachable.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| Error::vector_store_with_source("failed to connect to Postgres", e))?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VectorStoreGateway for PostgresVectorStore {
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS embeddings (
                id BIGSERIAL PRIMARY KEY,
                src TEXT NOT NULL,
                child_chunk VARCHAR(10),
                locations JSONB,
                orig_indexes JSONB,
                char_index BIGINT,
                token_count BIGINT,
                embedding_index INT NOT NULL,
                content TEXT,
                vector_embedding REAL[],
                qa_vector_embedding REAL[]
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::vector_store_with_source("failed to create embeddings table", e))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_src_child_chunk ON embeddings (src, child_chunk)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::vector_store_with_source("failed to create chunk index", e))?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_src_chunk_embedding
             ON embeddings (src, child_chunk, embedding_index)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::vector_store_with_source("failed to create row-key index", e))?;

        info!("Embeddings schema ensured");
        Ok(())
    }

    async fn insert(&self, row: EmbeddingRow) -> Result<()> {
        sqlx::query(
            "INSERT INTO embeddings
                (src, child_chunk, locations, orig_indexes, char_index,
                 token_count, embedding_index, content, vector_embedding,
                 qa_vector_embedding)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (src, child_chunk, embedding_index) DO UPDATE SET
                locations = EXCLUDED.locations,
                orig_indexes = EXCLUDED.orig_indexes,
                char_index = EXCLUDED.char_index,
                token_count = EXCLUDED.token_count,
                content = EXCLUDED.content,
                vector_embedding = EXCLUDED.vector_embedding,
                qa_vector_embedding = EXCLUDED.qa_vector_embedding",
        )
        .bind(row.src.as_str())
        .bind(row.child_chunk.as_str())
        .bind(&row.locations)
        .bind(&row.orig_indexes)
        .bind(row.char_index)
        .bind(row.token_count)
        .bind(row.embedding_index)
        .bind(&row.content)
        .bind(&row.content_vector)
        .bind(&row.qa_vector)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::vector_store_with_source("failed to insert embedding row", e))?;
        Ok(())
    }

    async fn delete_by_src(&self, src: &DocumentKey) -> Result<u64> {
        let result = sqlx::query("DELETE FROM embeddings WHERE src = $1")
            .bind(src.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::vector_store_with_source("failed to delete embeddings", e))?;
        Ok(result.rows_affected())
    }

    async fn delete_by_src_and_child_chunks(
        &self,
        src: &DocumentKey,
        chunks: &[ChildChunkId],
    ) -> Result<u64> {
        let chunk_ids: Vec<String> = chunks.iter().map(|c| c.as_str().to_owned()).collect();
        let result =
            sqlx::query("DELETE FROM embeddings WHERE src = $1 AND child_chunk = ANY($2)")
                .bind(src.as_str())
                .bind(&chunk_ids)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    Error::vector_store_with_source("failed to delete chunk embeddings", e)
                })?;
        Ok(result.rows_affected())
    }

    async fn count_embeddings(&self, src: &DocumentKey) -> Result<EmbeddingCounts> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total, COUNT(child_chunk) AS with_chunks
             FROM embeddings WHERE src = $1",
        )
        .bind(src.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::vector_store_with_source("failed to count embeddings", e))?;

        let total: i64 = row
            .try_get("total")
            .map_err(|e| Error::vector_store_with_source("bad count row", e))?;
        let with_chunks: i64 = row
            .try_get("with_chunks")
            .map_err(|e| Error::vector_store_with_source("bad count row", e))?;
        Ok(EmbeddingCounts {
            total: total.max(0) as u64,
            with_child_chunk: with_chunks.max(0) as u64,
        })
    }

    fn provider_name(&self) -> &str {
        "postgres"
    }
}
