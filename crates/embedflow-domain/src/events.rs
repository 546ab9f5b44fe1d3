//! Domain events and the event bus port.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::value_objects::{ChildChunkId, DocumentKey, ExecutionId, TaskKey};

/// Events published by the pipeline and the scheduler. Consumers are
/// observability surfaces only; no business logic depends on delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A document began processing
    DocumentStarted {
        /// Document key
        document: DocumentKey,
    },
    /// A child chunk finished successfully
    ChildCompleted {
        /// Document key
        document: DocumentKey,
        /// Child chunk id
        chunk: ChildChunkId,
        /// Embedding rows written for the chunk
        rows: usize,
    },
    /// A child chunk failed
    ChildFailed {
        /// Document key
        document: DocumentKey,
        /// Child chunk id
        chunk: ChildChunkId,
        /// Error description
        error: String,
    },
    /// All child chunks of a document completed
    DocumentCompleted {
        /// Document key
        document: DocumentKey,
    },
    /// A document was forced to failed
    DocumentFailed {
        /// Document key
        document: DocumentKey,
        /// Error description
        error: String,
    },
    /// A scheduler tick claimed a due task instance
    TaskClaimed {
        /// Task key
        task: TaskKey,
        /// The claimed due instant (RFC 3339)
        due_instance: String,
    },
    /// A claimed task was handed to the agent queue
    TaskDispatched {
        /// Task key
        task: TaskKey,
        /// Execution id of the dispatched run
        execution_id: ExecutionId,
    },
    /// A task execution completed
    TaskCompleted {
        /// Task key
        task: TaskKey,
        /// Execution id of the run
        execution_id: ExecutionId,
    },
    /// A task execution failed
    TaskFailed {
        /// Task key
        task: TaskKey,
        /// Error description
        error: String,
    },
}

/// Boxed stream of domain events.
pub type DomainEventStream = Pin<Box<dyn Stream<Item = DomainEvent> + Send>>;

/// In-process (or external) event bus.
#[async_trait]
pub trait EventBusProvider: Send + Sync {
    /// Publish a domain event. Delivery is best-effort; failures are the
    /// caller's to log, never to propagate.
    async fn publish_event(&self, event: DomainEvent) -> Result<()>;

    /// Subscribe to the event stream.
    async fn subscribe_events(&self) -> Result<DomainEventStream>;

    /// Returns `true` if at least one subscriber is attached.
    fn has_subscribers(&self) -> bool;
}
