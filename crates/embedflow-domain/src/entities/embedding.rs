//! Embedding rows persisted to the vector store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value_objects::{ChildChunkId, DocumentKey};

/// One persisted embedding: a local micro-chunk with both of its vectors.
///
/// Unique by `(src, child_chunk, embedding_index)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRow {
    /// Document the row belongs to
    pub src: DocumentKey,
    /// Child chunk the row belongs to
    pub child_chunk: ChildChunkId,
    /// Opaque location data from the chunker
    pub locations: Value,
    /// Opaque index data from the chunker
    pub orig_indexes: Value,
    /// Character offset of the micro-chunk within the document
    pub char_index: i64,
    /// Combined token count of both embedding calls
    pub token_count: i64,
    /// Position of the micro-chunk within its child chunk (0-based)
    pub embedding_index: i32,
    /// The micro-chunk text
    pub content: String,
    /// Content embedding vector
    pub content_vector: Vec<f32>,
    /// QA-augmented embedding vector
    pub qa_vector: Vec<f32>,
}
