//! Core business entities.

/// API key records and credential material
pub mod api_key;
/// Embedding rows persisted to the vector store
pub mod embedding;
/// Chunk payloads and queue event envelopes
pub mod ingest;
/// Document progress records and status machines
pub mod progress;
/// Scheduled tasks and execution logs
pub mod task;

pub use api_key::{AccountSecrets, ApiKeyRecord};
pub use embedding::EmbeddingRow;
pub use ingest::{ChunkPayload, LocalChunk, ObjectRef, ObjectStoreEvent};
pub use progress::{ChildProgress, ChildStatus, ParentStatus, ProgressData, ProgressRecord};
pub use task::{
    DateRange, ExecutionLogEntry, ExecutionStatus, ScheduledTask, TaskType,
};
