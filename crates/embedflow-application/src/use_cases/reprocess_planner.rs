//! Reprocess Planner Use Case
//!
//! # Overview
//! On forced reprocess, decides between **selective** cleanup (delete only
//! the embeddings of child chunks that never completed) and **full**
//! cleanup (wipe the document's embeddings and its progress record).
//!
//! Decision rules, in order:
//! 1. Chunk-file count differs from the progress map cardinality
//!    (structural change) - full cleanup, fresh start.
//! 2. Existing embedding rows lack chunk identification (legacy data) -
//!    full cleanup; selective deletion is impossible.
//! 3. Otherwise - selective cleanup of the incomplete chunks; completed
//!    rows and the progress record stay.
//! 4. No incomplete chunks - no-op.
//!
//! The planner runs at most once per document per process: workers consult
//! a mutex-guarded memo set before planning, so one force-reprocess batch
//! plans each document exactly once.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

use chrono::Utc;
use embedflow_domain::constants::keys::CHUNK_FILE_SUFFIX;
use embedflow_domain::entities::{ChildStatus, ParentStatus};
use embedflow_domain::error::Result;
use embedflow_domain::ports::providers::{
    ObjectStoreProvider, ProgressStore, VectorStoreGateway,
};
use embedflow_domain::value_objects::{ChildChunkId, DocumentKey};
use tracing::{info, warn};

/// What the planner did for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupDecision {
    /// Another message in this process already planned the document
    AlreadyPlanned,
    /// No progress data existed; nothing to clean
    FreshDocument,
    /// Structural change or legacy rows: everything was wiped
    Full,
    /// Only the named chunks' embeddings were deleted
    Selective(Vec<ChildChunkId>),
    /// All chunks completed; nothing to clean
    NoOp,
}

/// Planner with its per-process memo set.
pub struct ReprocessPlanner {
    progress: Arc<dyn ProgressStore>,
    vector_store: Arc<dyn VectorStoreGateway>,
    object_store: Arc<dyn ObjectStoreProvider>,
    chunks_bucket: String,
    planned: Mutex<HashSet<DocumentKey>>,
}

impl ReprocessPlanner {
    /// Create a planner reading chunk files from `chunks_bucket`.
    pub fn new(
        progress: Arc<dyn ProgressStore>,
        vector_store: Arc<dyn VectorStoreGateway>,
        object_store: Arc<dyn ObjectStoreProvider>,
        chunks_bucket: impl Into<String>,
    ) -> Self {
        Self {
            progress,
            vector_store,
            object_store,
            chunks_bucket: chunks_bucket.into(),
            planned: Mutex::new(HashSet::new()),
        }
    }

    /// Forget all planned documents. Wired to a periodic reset (or SIGHUP)
    /// so long-lived workers can honor a new force-reprocess cycle.
    pub fn reset_memo(&self) {
        if let Ok(mut planned) = self.planned.lock() {
            planned.clear();
        }
    }

    fn already_planned(&self, key: &DocumentKey) -> bool {
        match self.planned.lock() {
            Ok(mut planned) => !planned.insert(key.clone()),
            Err(_) => false,
        }
    }

    /// Chunk ordinals present in the chunk-file listing for a document.
    /// Non-numeric suffixes are ignored.
    async fn actual_chunk_ids(&self, key: &DocumentKey) -> Result<HashSet<u32>> {
        let prefix = format!("{key}-");
        let keys = self
            .object_store
            .list_keys(&self.chunks_bucket, &prefix)
            .await?;
        Ok(keys
            .iter()
            .filter_map(|object_key| {
                let stem = object_key.strip_suffix(CHUNK_FILE_SUFFIX)?;
                stem.rsplit('-').next()?.parse().ok()
            })
            .collect())
    }

    /// Run the cleanup decision for one document, once per process.
    ///
    /// # Errors
    ///
    /// Returns an error when a cleanup write fails; the read-side structure
    /// check degrades gracefully (a failed listing skips the structural
    /// comparison).
    pub async fn prepare(&self, key: &DocumentKey) -> Result<CleanupDecision> {
        if self.already_planned(key) {
            return Ok(CleanupDecision::AlreadyPlanned);
        }

        info!(document = %key, "Planning reprocess cleanup");

        let Some(record) = self.progress.get(key, true).await? else {
            info!(document = %key, "No existing progress, all chunks will process fresh");
            return Ok(CleanupDecision::FreshDocument);
        };
        if record.data.child_chunks.is_empty() {
            info!(document = %key, "No child chunk data, all chunks will process fresh");
            return Ok(CleanupDecision::FreshDocument);
        }

        let existing: HashSet<u32> = record
            .data
            .child_chunks
            .keys()
            .filter_map(|id| id.ordinal())
            .collect();

        // Rule 1: structural change forces a full wipe. A failed listing
        // skips the comparison rather than failing the whole reprocess.
        match self.actual_chunk_ids(key).await {
            Ok(actual) if actual != existing => {
                info!(
                    document = %key,
                    existing = existing.len(),
                    actual = actual.len(),
                    "Document structure changed, resetting progress"
                );
                return self.full_cleanup(key, actual.len()).await;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(document = %key, error = %e, "Failed to list chunk files, skipping structure check");
            }
        }

        // Rule 2: legacy rows without chunk identification cannot be
        // selectively removed. The structure check already passed, so the
        // record's cardinality is the expected chunk count.
        let counts = self.vector_store.count_embeddings(key).await?;
        if counts.total > 0 && counts.with_child_chunk < counts.total {
            info!(
                document = %key,
                total = counts.total,
                with_chunks = counts.with_child_chunk,
                "Existing embeddings lack chunk identification, full reprocess"
            );
            return self.full_cleanup(key, existing.len()).await;
        }

        // Rules 3 and 4: selective cleanup of incomplete chunks, or no-op.
        let incomplete = record.incomplete_children();
        if incomplete.is_empty() {
            info!(document = %key, "All chunks completed, no cleanup needed");
            return Ok(CleanupDecision::NoOp);
        }

        let removed = self
            .vector_store
            .delete_by_src_and_child_chunks(key, &incomplete)
            .await?;

        // Retry in place: the incomplete children go back to `starting`
        // and the parent leaves its terminal state, so the redelivered
        // messages are not dropped by the terminal check. This reset is
        // the operator-driven escape hatch from the absorbing states; the
        // completed children keep their entries and their rows.
        let mut reset = record;
        for chunk in &incomplete {
            if let Some(entry) = reset.data.child_chunks.get_mut(chunk) {
                entry.status = ChildStatus::Starting;
                entry.version += 1;
                entry.error = None;
                entry.last_updated = Utc::now();
            }
        }
        reset.parent_chunk_status = Some(ParentStatus::Processing);
        reset.error_message = None;
        reset.last_updated = Utc::now();
        self.progress.put(key, reset).await?;

        info!(
            document = %key,
            chunks = incomplete.len(),
            rows = removed,
            "Selective cleanup reset incomplete chunks for retry"
        );
        Ok(CleanupDecision::Selective(incomplete))
    }

    /// Wipe everything and seed a fresh record carrying the expected chunk
    /// count, so the aggregation knows how many children must report
    /// before the document can complete.
    async fn full_cleanup(&self, key: &DocumentKey, expected_chunks: usize) -> Result<CleanupDecision> {
        let removed = self.vector_store.delete_by_src(key).await?;
        self.progress.delete(key).await?;

        let mut fresh = embedflow_domain::entities::ProgressRecord::new(Utc::now());
        fresh.data.total_chunks = expected_chunks;
        self.progress.put(key, fresh).await?;

        info!(
            document = %key,
            rows = removed,
            expected_chunks,
            "Full cleanup complete"
        );
        Ok(CleanupDecision::Full)
    }
}
