//! Embedding vector value object.

use serde::{Deserialize, Serialize};

/// A single embedding result: the vector plus the token count the model
/// consumed producing it. Dimensionality is fixed by the embedding model;
/// the domain is model-agnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    /// The embedding vector components
    pub vector: Vec<f32>,
    /// Tokens consumed to produce this vector
    pub token_count: i64,
}

impl EmbeddingVector {
    /// Create a new embedding vector.
    #[must_use]
    pub fn new(vector: Vec<f32>, token_count: i64) -> Self {
        Self {
            vector,
            token_count,
        }
    }

    /// Number of dimensions in the vector.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}
