//! Immutable value objects.

/// Strong-typed keys for documents, chunks, tasks, and executions
pub mod keys;
/// Embedding vector with token accounting
pub mod vector;

pub use vector::EmbeddingVector;
pub use keys::{ChildChunkId, DocumentKey, ExecutionId, RunId, TaskId, TaskKey, UserId};
