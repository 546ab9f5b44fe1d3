//! Provider port interfaces.

/// API key resolution
pub mod api_keys;
/// Embedding, QA summary, and secrets providers
pub mod embedding;
/// Email notification delivery
pub mod mailer;
/// Object store access
pub mod object_store;
/// Progress record coordination store
pub mod progress_store;
/// Queue send/receive/ack
pub mod queue;
/// Task registry store
pub mod task_repository;
/// Data-source key translation
pub mod translate;
/// Vector store gateway
pub mod vector_store;

pub use api_keys::ApiKeyResolver;
pub use embedding::{EmbeddingProvider, QaSummaryProvider, SecretsProvider};
pub use mailer::MailerProvider;
pub use object_store::{ObjectMeta, ObjectStoreProvider};
pub use progress_store::ProgressStore;
pub use queue::{QueueMessage, QueueProvider};
pub use task_repository::TaskRepository;
pub use translate::KeyTranslator;
pub use vector_store::{EmbeddingCounts, VectorStoreGateway};
