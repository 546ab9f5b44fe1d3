//! Shared fixtures: an in-memory pipeline, failure-injecting providers,
//! and payload seeding helpers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use embedflow_application::{
    EmbeddingWorker, EmbeddingWorkerDeps, ProgressCoordinator, ReprocessPlanner,
};
use chrono::Utc;
use embedflow_domain::entities::ProgressRecord;
use embedflow_domain::error::{Error, Result};
use embedflow_domain::events::{DomainEvent, DomainEventStream, EventBusProvider};
use embedflow_domain::ports::providers::{
    EmbeddingProvider, KeyTranslator, QaSummaryProvider, QueueMessage, QueueProvider,
    SecretsProvider,
};
use embedflow_domain::ports::providers::ProgressStore;
use embedflow_domain::value_objects::{DocumentKey, EmbeddingVector};
use embedflow_providers::embedding::{
    HashEmbeddingProvider, LocalQaSummaryProvider, StaticSecretsProvider,
};
use embedflow_providers::coordination::InMemoryProgressStore;
use embedflow_providers::object_store::InMemoryObjectStore;
use embedflow_providers::queue::InMemoryQueue;
use embedflow_providers::vector_store::InMemoryVectorStore;
use serde_json::json;

/// Bucket holding chunk payloads in the fixtures.
pub const CHUNKS_BUCKET: &str = "rag-chunks";

/// Marker that makes [`FailingEmbeddingProvider`] reject a text.
pub const FAIL_MARKER: &str = "FAIL_EMBED";

/// Event bus that drops everything.
#[derive(Debug, Default)]
pub struct NullEventBus;

#[async_trait]
impl EventBusProvider for NullEventBus {
    async fn publish_event(&self, _event: DomainEvent) -> Result<()> {
        Ok(())
    }

    async fn subscribe_events(&self) -> Result<DomainEventStream> {
        Ok(Box::pin(futures::stream::empty()))
    }

    fn has_subscribers(&self) -> bool {
        false
    }
}

/// Embedding provider that fails on texts carrying [`FAIL_MARKER`].
pub struct FailingEmbeddingProvider {
    inner: HashEmbeddingProvider,
}

impl FailingEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            inner: HashEmbeddingProvider::new(dimensions),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        if text.contains(FAIL_MARKER) {
            return Err(Error::embedding("embedding service rejected the text"));
        }
        self.inner.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn provider_name(&self) -> &str {
        "failing"
    }
}

/// Key translator that always fails (partial-failure injection).
#[derive(Debug, Default)]
pub struct FailingKeyTranslator;

#[async_trait]
impl KeyTranslator for FailingKeyTranslator {
    async fn to_global_id(&self, key: &str) -> Result<String> {
        Err(Error::internal(format!("translation failed for {key}")))
    }
}

/// In-memory pipeline wiring shared by the scenario suites.
pub struct Pipeline {
    pub progress: Arc<InMemoryProgressStore>,
    pub vector: Arc<InMemoryVectorStore>,
    pub objects: Arc<InMemoryObjectStore>,
    pub queue: Arc<InMemoryQueue>,
    pub coordinator: Arc<ProgressCoordinator>,
    pub planner: Arc<ReprocessPlanner>,
}

impl Pipeline {
    pub fn new() -> Self {
        let progress = Arc::new(InMemoryProgressStore::new());
        let vector = Arc::new(InMemoryVectorStore::new());
        let objects = Arc::new(InMemoryObjectStore::new());
        let queue = Arc::new(InMemoryQueue::new());
        let event_bus: Arc<dyn EventBusProvider> = Arc::new(NullEventBus);

        let coordinator = Arc::new(ProgressCoordinator::new(
            Arc::clone(&progress) as Arc<dyn embedflow_domain::ports::providers::ProgressStore>,
            Arc::clone(&event_bus),
        ));
        let planner = Arc::new(ReprocessPlanner::new(
            Arc::clone(&progress) as Arc<dyn embedflow_domain::ports::providers::ProgressStore>,
            Arc::clone(&vector)
                as Arc<dyn embedflow_domain::ports::providers::VectorStoreGateway>,
            Arc::clone(&objects)
                as Arc<dyn embedflow_domain::ports::providers::ObjectStoreProvider>,
            CHUNKS_BUCKET,
        ));

        Self {
            progress,
            vector,
            objects,
            queue,
            coordinator,
            planner,
        }
    }

    /// Worker with failure-injecting embeddings and static secrets.
    pub fn worker(&self) -> EmbeddingWorker {
        self.worker_with(
            Arc::new(FailingEmbeddingProvider::new(8)),
            Arc::new(StaticSecretsProvider::new(json!({}))),
        )
    }

    /// Worker with explicit embedding and secrets providers.
    pub fn worker_with(
        &self,
        embedding: Arc<dyn EmbeddingProvider>,
        secrets: Arc<dyn SecretsProvider>,
    ) -> EmbeddingWorker {
        let qa: Arc<dyn QaSummaryProvider> = Arc::new(LocalQaSummaryProvider::new());
        EmbeddingWorker::new(
            EmbeddingWorkerDeps {
                coordinator: Arc::clone(&self.coordinator),
                planner: Arc::clone(&self.planner),
                vector_store: Arc::clone(&self.vector)
                    as Arc<dyn embedflow_domain::ports::providers::VectorStoreGateway>,
                object_store: Arc::clone(&self.objects)
                    as Arc<dyn embedflow_domain::ports::providers::ObjectStoreProvider>,
                embedding,
                qa,
                secrets,
                queue: Arc::clone(&self.queue)
                    as Arc<dyn embedflow_domain::ports::providers::QueueProvider>,
                event_bus: Arc::new(NullEventBus),
            },
            Duration::ZERO,
        )
    }
}

/// Object key of one chunk payload file.
pub fn chunk_key(doc: &str, k: u32) -> String {
    format!("{doc}-{k}.chunks.json")
}

/// Seed the progress record the external chunker writes before enqueueing:
/// the expected chunk count, no per-child entries yet.
pub async fn seed_progress_total(progress: &InMemoryProgressStore, doc: &str, total: usize) {
    let mut record = ProgressRecord::new(Utc::now());
    record.data.total_chunks = total;
    progress
        .put(&DocumentKey::from_src(doc), record)
        .await
        .expect("seed progress");
}

/// Seed one chunk payload file, optionally flagged for force reprocess.
pub fn seed_chunk_file(
    objects: &InMemoryObjectStore,
    doc: &str,
    k: u32,
    contents: &[&str],
    force: bool,
) {
    let chunks: Vec<serde_json::Value> = contents
        .iter()
        .enumerate()
        .map(|(i, content)| {
            json!({
                "content": content,
                "locations": [{"page": i + 1}],
                "indexes": [i],
                "char_index": i * 100,
            })
        })
        .collect();
    let payload = json!({"src": doc, "chunks": chunks});

    let mut metadata = HashMap::new();
    metadata.insert("object_key".to_owned(), doc.to_owned());
    if force {
        metadata.insert("force_reprocess".to_owned(), "true".to_owned());
    }
    objects.put_with_metadata(
        CHUNKS_BUCKET,
        &chunk_key(doc, k),
        serde_json::to_vec(&payload).expect("payload serializes"),
        "application/json",
        metadata,
    );
}

/// Enqueue the queue-event envelope for one chunk file and receive it.
pub async fn enqueue_and_receive(queue: &InMemoryQueue, doc: &str, k: u32) -> QueueMessage {
    let body = json!({
        "Records": [
            {"s3": {"bucket": {"name": CHUNKS_BUCKET},
                    "object": {"key": chunk_key(doc, k)}}}
        ]
    })
    .to_string();
    queue.send(body).await.expect("send");
    queue
        .receive(1)
        .await
        .expect("receive")
        .pop()
        .expect("one message")
}
