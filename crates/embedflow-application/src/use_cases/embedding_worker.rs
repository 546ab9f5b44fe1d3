//! Embedding Worker Use Case
//!
//! # Overview
//! Consumes one queue message = one child chunk. For every local
//! micro-chunk it computes a content embedding and a QA-augmented
//! embedding, persists the row, and reports status to the progress
//! coordinator. Failures are terminal for the whole child: the child and
//! its parent are forced to `failed` and the message is acked so redelivery
//! storms cannot form - retries are operator-driven via force reprocess.
//!
//! # Ack discipline
//! The message is acked after terminal handling of every path: success,
//! child failure, terminal-parent observation, and selective skip. Only a
//! crash leaves the message in flight for redelivery.

use std::sync::Arc;
use std::time::Duration;

use embedflow_domain::constants::keys::{METADATA_KEY_FORCE_REPROCESS, METADATA_KEY_OBJECT_KEY};
use embedflow_domain::entities::{
    AccountSecrets, ChildStatus, ChunkPayload, EmbeddingRow, ObjectRef, ObjectStoreEvent,
    ParentStatus,
};
use embedflow_domain::error::{Error, Result};
use embedflow_domain::events::{DomainEvent, EventBusProvider};
use embedflow_domain::ports::providers::{
    EmbeddingProvider, ObjectStoreProvider, QaSummaryProvider, QueueMessage, QueueProvider,
    SecretsProvider, VectorStoreGateway,
};
use embedflow_domain::utils::preprocess;
use embedflow_domain::value_objects::{ChildChunkId, DocumentKey};
use percent_encoding::percent_decode_str;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::use_cases::progress_coordinator::ProgressCoordinator;
use crate::use_cases::reprocess_planner::ReprocessPlanner;

/// Injected dependencies of the worker.
pub struct EmbeddingWorkerDeps {
    /// Progress coordinator
    pub coordinator: Arc<ProgressCoordinator>,
    /// Reprocess planner
    pub planner: Arc<ReprocessPlanner>,
    /// Vector store gateway
    pub vector_store: Arc<dyn VectorStoreGateway>,
    /// Object store holding chunk payloads
    pub object_store: Arc<dyn ObjectStoreProvider>,
    /// Embedding provider
    pub embedding: Arc<dyn EmbeddingProvider>,
    /// QA summary provider
    pub qa: Arc<dyn QaSummaryProvider>,
    /// Per-document secrets provider
    pub secrets: Arc<dyn SecretsProvider>,
    /// The chunk queue (for acks)
    pub queue: Arc<dyn QueueProvider>,
    /// Event bus
    pub event_bus: Arc<dyn EventBusProvider>,
}

/// Worker over the chunk queue.
pub struct EmbeddingWorker {
    deps: EmbeddingWorkerDeps,
    aggregation_delay: Duration,
    account: Mutex<Option<AccountSecrets>>,
}

/// Force-reprocess markers read from the chunk object's metadata.
struct ObjectMarkers {
    document_id: Option<String>,
    force_reprocess: bool,
}

impl EmbeddingWorker {
    /// Create a worker.
    ///
    /// `aggregation_delay` is the pause between a child completion and the
    /// parent aggregation read; a store that reads its own writes can run
    /// with zero.
    pub fn new(deps: EmbeddingWorkerDeps, aggregation_delay: Duration) -> Self {
        Self {
            deps,
            aggregation_delay,
            account: Mutex::new(None),
        }
    }

    /// Process one message end-to-end and ack it. Processing failures are
    /// terminal handling (the child is failed), so the ack is
    /// unconditional; only a crash leaves the message for redelivery.
    pub async fn process_message(&self, message: QueueMessage) {
        if let Err(e) = self.handle(&message).await {
            error!(message_id = %message.id, error = %e, "Message processing failed");
        }
        if let Err(e) = self.deps.queue.ack(&message.receipt_handle).await {
            warn!(message_id = %message.id, error = %e, "Failed to ack message");
        }
    }

    async fn handle(&self, message: &QueueMessage) -> Result<()> {
        let event = ObjectStoreEvent::parse(&message.body)?;
        let object = event.first_object()?;

        let chunk = ChildChunkId::from_object_key(&object.key)?;
        let mut document = DocumentKey::from_src(&object.key);

        let markers = self.read_markers(&object).await;
        let document_id = markers
            .document_id
            .clone()
            .unwrap_or_else(|| document.as_str().to_owned());

        info!(
            document = %document,
            chunk = %chunk,
            force_reprocess = markers.force_reprocess,
            "Processing child chunk message"
        );

        // Secrets are resolved once per worker batch; a missing secret
        // source fails the whole document before any child work.
        let account = match self.resolve_account(&document_id).await {
            Ok(account) => account,
            Err(e) => {
                let message = e.to_string();
                self.deps
                    .coordinator
                    .update_parent_status(&document, Some(ParentStatus::Failed), Some(message))
                    .await?;
                return Err(e);
            }
        };

        if markers.force_reprocess {
            let decision = self.deps.planner.prepare(&document).await?;
            info!(document = %document, decision = ?decision, "Reprocess plan");
        }

        if self.deps.coordinator.is_terminal(&document).await? {
            info!(document = %document, chunk = %chunk, "Parent terminal, dropping message");
            return Ok(());
        }

        if markers.force_reprocess && self.chunk_already_completed(&document, &chunk).await? {
            info!(document = %document, chunk = %chunk, "Chunk already completed, skipping");
            // A fully completed map may just need the parent flipped.
            self.deps
                .coordinator
                .update_parent_status(&document, None, None)
                .await
                .ok();
            return Ok(());
        }

        let payload = self.fetch_payload(&object).await?;
        // The payload is authoritative for the document key.
        if !payload.src.is_empty() {
            document = DocumentKey::from_src(&payload.src);
        }

        self.deps
            .coordinator
            .update_parent_status(&document, Some(ParentStatus::Processing), None)
            .await?;

        self.embed_chunks(&document, &chunk, &payload, &account)
            .await;
        Ok(())
    }

    async fn read_markers(&self, object: &ObjectRef) -> ObjectMarkers {
        match self
            .deps
            .object_store
            .head(&object.bucket, &object.key)
            .await
        {
            Ok(Some(meta)) => {
                let document_id = meta
                    .metadata
                    .get(METADATA_KEY_OBJECT_KEY)
                    .map(|raw| {
                        percent_decode_str(raw)
                            .decode_utf8()
                            .map_or_else(|_| raw.clone(), |decoded| decoded.into_owned())
                    });
                let force_reprocess = meta
                    .metadata
                    .get(METADATA_KEY_FORCE_REPROCESS)
                    .is_some_and(|raw| raw.eq_ignore_ascii_case("true"));
                ObjectMarkers {
                    document_id,
                    force_reprocess,
                }
            }
            Ok(None) => ObjectMarkers {
                document_id: None,
                force_reprocess: false,
            },
            Err(e) => {
                // Manual-ingest path: no metadata available.
                warn!(key = %object.key, error = %e, "Could not read object metadata");
                ObjectMarkers {
                    document_id: None,
                    force_reprocess: false,
                }
            }
        }
    }

    async fn resolve_account(&self, document_id: &str) -> Result<AccountSecrets> {
        let mut cached = self.account.lock().await;
        if let Some(account) = cached.as_ref() {
            return Ok(account.clone());
        }
        let account = self
            .deps
            .secrets
            .rag_secrets_for_document(document_id)
            .await?;
        *cached = Some(account.clone());
        Ok(account)
    }

    async fn chunk_already_completed(
        &self,
        document: &DocumentKey,
        chunk: &ChildChunkId,
    ) -> Result<bool> {
        Ok(self
            .deps
            .coordinator
            .child_status(document, chunk)
            .await?
            .is_some_and(|status| status == ChildStatus::Completed))
    }

    async fn fetch_payload(&self, object: &ObjectRef) -> Result<ChunkPayload> {
        let bytes = self
            .deps
            .object_store
            .get(&object.bucket, &object.key)
            .await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Embed every local micro-chunk in order. Any failure fails the whole
    /// child and eagerly forces the parent to `failed`.
    async fn embed_chunks(
        &self,
        document: &DocumentKey,
        chunk: &ChildChunkId,
        payload: &ChunkPayload,
        account: &AccountSecrets,
    ) {
        info!(
            document = %document,
            chunk = %chunk,
            local_chunks = payload.chunks.len(),
            "Embedding child chunk"
        );

        if let Err(e) = self
            .deps
            .coordinator
            .update_child_status(document, chunk, ChildStatus::Processing, None)
            .await
        {
            warn!(document = %document, chunk = %chunk, error = %e, "Failed to mark child processing");
        }

        for (index, local) in payload.chunks.iter().enumerate() {
            if let Err(e) = self
                .embed_local_chunk(document, chunk, index as i32, local, account)
                .await
            {
                let message = format!(
                    "Error processing local chunk {index} of child chunk {chunk} in {document}: {e}"
                );
                error!(document = %document, chunk = %chunk, index, error = %e, "Local chunk failed");
                if let Err(e) = self
                    .deps
                    .coordinator
                    .fail_child(document, chunk, message)
                    .await
                {
                    error!(document = %document, chunk = %chunk, error = %e, "Failed to record child failure");
                }
                return;
            }
        }

        if let Err(e) = self
            .deps
            .coordinator
            .update_child_status(document, chunk, ChildStatus::Completed, None)
            .await
        {
            warn!(document = %document, chunk = %chunk, error = %e, "Failed to mark child completed");
        }
        if let Err(e) = self
            .deps
            .event_bus
            .publish_event(DomainEvent::ChildCompleted {
                document: document.clone(),
                chunk: chunk.clone(),
                rows: payload.chunks.len(),
            })
            .await
        {
            warn!(error = %e, "Failed to publish child completion event");
        }

        // Narrow the read-after-write window before aggregating.
        if !self.aggregation_delay.is_zero() {
            tokio::time::sleep(self.aggregation_delay).await;
        }
        if let Err(e) = self
            .deps
            .coordinator
            .update_parent_status(document, None, None)
            .await
        {
            warn!(document = %document, error = %e, "Failed to aggregate parent status");
        }
    }

    async fn embed_local_chunk(
        &self,
        document: &DocumentKey,
        chunk: &ChildChunkId,
        index: i32,
        local: &embedflow_domain::entities::LocalChunk,
        account: &AccountSecrets,
    ) -> Result<()> {
        let clean = preprocess(&local.content);
        if clean.is_empty() {
            return Err(Error::invalid_argument("local chunk is empty after preprocessing"));
        }

        let content_embedding = self.deps.embedding.embed(&clean).await?;
        let qa_summary = self.deps.qa.generate_questions(&clean, account).await?;
        let qa_embedding = self.deps.embedding.embed(&qa_summary).await?;

        let row = EmbeddingRow {
            src: document.clone(),
            child_chunk: chunk.clone(),
            locations: local.locations.clone(),
            orig_indexes: local.indexes.clone(),
            char_index: local.char_index,
            token_count: content_embedding.token_count + qa_embedding.token_count,
            embedding_index: index,
            content: local.content.clone(),
            content_vector: content_embedding.vector,
            qa_vector: qa_embedding.vector,
        };
        // Per-micro-chunk commit: the row is durable before the next
        // suspension point, keeping mid-failure retries cheap.
        self.deps.vector_store.insert(row).await
    }
}
