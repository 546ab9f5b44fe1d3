use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use embedflow_domain::entities::{ExecutionLogEntry, ScheduledTask};
use embedflow_domain::error::{Error, Result};
use embedflow_domain::ports::cas::CasOutcome;
use embedflow_domain::ports::providers::{ObjectStoreProvider, TaskRepository};
use embedflow_domain::value_objects::{ExecutionId, RunId, TaskKey};
use tracing::warn;

/// In-memory task registry.
///
/// The claim condition is evaluated under the per-entry lock; across
/// concurrent ticks at most one claim per due instance succeeds. Log detail
/// payloads go to the configured logs bucket of the object store.
pub struct InMemoryTaskRepository {
    tasks: DashMap<TaskKey, ScheduledTask>,
    object_store: Arc<dyn ObjectStoreProvider>,
    logs_bucket: String,
}

impl InMemoryTaskRepository {
    /// Create an empty registry writing detail blobs to `logs_bucket`.
    pub fn new(object_store: Arc<dyn ObjectStoreProvider>, logs_bucket: impl Into<String>) -> Self {
        Self {
            tasks: DashMap::new(),
            object_store,
            logs_bucket: logs_bucket.into(),
        }
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn list_active_tasks(&self) -> Result<Vec<ScheduledTask>> {
        let mut tasks: Vec<ScheduledTask> = self
            .tasks
            .iter()
            .filter(|entry| entry.active)
            .map(|entry| entry.clone())
            .collect();
        tasks.sort_by(|a, b| a.key().to_string().cmp(&b.key().to_string()));
        Ok(tasks)
    }

    async fn get_task(&self, key: &TaskKey) -> Result<Option<ScheduledTask>> {
        Ok(self.tasks.get(key).map(|entry| entry.clone()))
    }

    async fn put_task(&self, task: ScheduledTask) -> Result<()> {
        self.tasks.insert(task.key(), task);
        Ok(())
    }

    async fn claim(
        &self,
        key: &TaskKey,
        now: DateTime<Utc>,
        run_id: &RunId,
        earliest_due: DateTime<Utc>,
    ) -> Result<CasOutcome> {
        let mut task = self
            .tasks
            .get_mut(key)
            .ok_or_else(|| Error::not_found(format!("task {key}")))?;

        // Condition: lastCheckedAt absent OR lastCheckedAt < earliest due.
        let eligible = task
            .last_checked_at
            .is_none_or(|checked| checked < earliest_due);
        if !eligible {
            return Ok(CasOutcome::ConditionFailed);
        }

        task.last_checked_at = Some(now);
        task.last_check_run_id = Some(run_id.as_string());
        Ok(CasOutcome::Applied)
    }

    async fn clear_claim(&self, key: &TaskKey, last_run_at: Option<DateTime<Utc>>) -> Result<()> {
        let mut task = self
            .tasks
            .get_mut(key)
            .ok_or_else(|| Error::not_found(format!("task {key}")))?;
        task.last_checked_at = None;
        task.last_check_run_id = None;
        if let Some(at) = last_run_at {
            task.last_run_at = Some(at);
        }
        Ok(())
    }

    async fn append_or_update_log_entry(
        &self,
        key: &TaskKey,
        mut entry: ExecutionLogEntry,
        details: Option<serde_json::Value>,
    ) -> Result<ExecutionId> {
        // Detail blob first; a failed write downgrades the entry rather
        // than failing the log update.
        if let Some(details) = details {
            let blob_key = format!(
                "{}/{}/logs/{}.json",
                key.user, key.task_id, entry.execution_id
            );
            match serde_json::to_vec(&details) {
                Ok(body) => {
                    match self
                        .object_store
                        .put(&self.logs_bucket, &blob_key, body, "application/json")
                        .await
                    {
                        Ok(()) => entry.details_key = Some(blob_key),
                        Err(e) => {
                            warn!(task = %key, error = %e, "Failed to archive log details");
                        }
                    }
                }
                Err(e) => warn!(task = %key, error = %e, "Failed to serialize log details"),
            }
        }

        let mut task = self
            .tasks
            .get_mut(key)
            .ok_or_else(|| Error::not_found(format!("task {key}")))?;

        let execution_id = entry.execution_id.clone();
        let executed_at = entry.executed_at;
        if let Some(existing) = task
            .logs
            .iter_mut()
            .find(|log| log.execution_id == entry.execution_id)
        {
            *existing = existing.merged_with(entry);
        } else {
            task.logs.insert(0, entry);
        }
        task.last_run_at = Some(executed_at);
        Ok(execution_id)
    }
}
