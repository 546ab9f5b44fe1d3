use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use embedflow_domain::entities::{
    ChildProgress, ChildStatus, ParentStatus, ProgressRecord,
};
use embedflow_domain::error::Result;
use embedflow_domain::ports::cas::CasOutcome;
use embedflow_domain::ports::providers::ProgressStore;
use embedflow_domain::value_objects::{ChildChunkId, DocumentKey};

/// In-memory progress store.
///
/// Reads are always strongly consistent; the `consistent` flag is accepted
/// for contract parity with remote backends. Conditions are evaluated under
/// the per-entry lock, so two workers racing the same transition observe
/// exactly one `Applied`.
#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    records: DashMap<DocumentKey, ProgressRecord>,
}

impl InMemoryProgressStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn get(&self, key: &DocumentKey, _consistent: bool) -> Result<Option<ProgressRecord>> {
        Ok(self.records.get(key).map(|entry| entry.clone()))
    }

    async fn put(&self, key: &DocumentKey, record: ProgressRecord) -> Result<()> {
        self.records.insert(key.clone(), record);
        Ok(())
    }

    async fn write_child_status(
        &self,
        key: &DocumentKey,
        chunk: &ChildChunkId,
        status: ChildStatus,
        error: Option<String>,
    ) -> Result<CasOutcome> {
        let now = Utc::now();
        let mut record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| ProgressRecord::new(now));

        // Condition: child status attribute absent OR non-terminal.
        if let Some(existing) = record.data.child_chunks.get(chunk) {
            if existing.status.is_terminal() {
                return Ok(CasOutcome::ConditionFailed);
            }
        }

        let version = record
            .data
            .child_chunks
            .get(chunk)
            .map_or(0, |entry| entry.version)
            + 1;
        record.data.child_chunks.insert(
            chunk.clone(),
            ChildProgress {
                status,
                last_updated: now,
                version,
                error: error.filter(|_| status == ChildStatus::Failed),
            },
        );
        record.last_updated = now;
        Ok(CasOutcome::Applied)
    }

    async fn write_parent_status(
        &self,
        key: &DocumentKey,
        status: ParentStatus,
        error: Option<String>,
    ) -> Result<CasOutcome> {
        let now = Utc::now();
        let mut record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| ProgressRecord::new(now));

        // Condition: parent status attribute absent OR non-terminal.
        if record
            .parent_chunk_status
            .is_some_and(|current| current.is_terminal())
        {
            return Ok(CasOutcome::ConditionFailed);
        }

        record.parent_chunk_status = Some(status);
        record.last_updated = now;
        if status == ParentStatus::Failed {
            if let Some(message) = error {
                record.error_message = Some(message);
            }
        }
        Ok(CasOutcome::Applied)
    }

    async fn set_terminated(&self, key: &DocumentKey) -> Result<bool> {
        let now = Utc::now();
        let mut record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| ProgressRecord::new(now));
        record.terminated = true;
        record.last_updated = now;
        Ok(true)
    }

    async fn delete(&self, key: &DocumentKey) -> Result<()> {
        self.records.remove(key);
        Ok(())
    }
}
