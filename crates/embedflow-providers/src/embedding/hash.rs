use async_trait::async_trait;
use embedflow_domain::error::Result;
use embedflow_domain::ports::providers::EmbeddingProvider;
use embedflow_domain::value_objects::EmbeddingVector;
use sha2::{Digest, Sha256};

/// Deterministic local embedding provider.
///
/// Derives vector components from a SHA-256 stream over the input, so the
/// same text always embeds to the same vector. No semantic meaning; used
/// for development and tests where no embedding service is reachable.
#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    dimensions: usize,
}

impl HashEmbeddingProvider {
    /// Create a provider emitting `dimensions`-long vectors.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        let mut vector = Vec::with_capacity(self.dimensions);
        let mut counter = 0u32;
        while vector.len() < self.dimensions {
            let mut hasher = Sha256::new();
            hasher.update(counter.to_be_bytes());
            hasher.update(text.as_bytes());
            let digest = hasher.finalize();
            for chunk in digest.chunks_exact(4) {
                if vector.len() == self.dimensions {
                    break;
                }
                let raw = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                // Map to [-1, 1)
                vector.push((raw as f32 / u32::MAX as f32) * 2.0 - 1.0);
            }
            counter += 1;
        }

        let token_count = (text.len() as i64 / 4).max(1);
        Ok(EmbeddingVector::new(vector, token_count))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "hash"
    }
}
