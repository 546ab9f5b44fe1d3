use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::entities::{ExecutionLogEntry, ScheduledTask};
use crate::error::Result;
use crate::ports::cas::CasOutcome;
use crate::value_objects::{ExecutionId, RunId, TaskKey};

/// Task registry store.
///
/// Task records are owned by their user; the scheduler takes ephemeral
/// claims on them through the conditional `claim` write. Log detail
/// payloads are stored out-of-band in the object store and referenced by
/// `detailsKey`.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// All tasks with `active = true` (paginated scan in real backends).
    async fn list_active_tasks(&self) -> Result<Vec<ScheduledTask>>;

    /// Read one task.
    async fn get_task(&self, key: &TaskKey) -> Result<Option<ScheduledTask>>;

    /// Create or replace a task definition.
    async fn put_task(&self, task: ScheduledTask) -> Result<()>;

    /// Atomically claim a due instance of the task.
    ///
    /// Sets `lastCheckedAt = now` and `lastCheckRunId = run_id` under the
    /// condition "lastCheckedAt does not exist OR lastCheckedAt <
    /// earliest_due". Exactly one concurrent tick can win this write for a
    /// given due instance.
    ///
    /// # Returns
    /// Ok(outcome) - `ConditionFailed` when another tick already claimed
    async fn claim(
        &self,
        key: &TaskKey,
        now: DateTime<Utc>,
        run_id: &RunId,
        earliest_due: DateTime<Utc>,
    ) -> Result<CasOutcome>;

    /// Remove the claim markers (`lastCheckedAt`, `lastCheckRunId`) so the
    /// task becomes eligible on its next cron fire. Optionally advances
    /// `lastRunAt` in the same write.
    async fn clear_claim(&self, key: &TaskKey, last_run_at: Option<DateTime<Utc>>) -> Result<()>;

    /// Append a log entry, or merge it into an existing entry with the same
    /// `executionId` (preserving the original `startTime`). New entries are
    /// inserted at the head. Advances the task's `lastRunAt` to the entry's
    /// `executedAt`. The detail payload, when given, is written to the logs
    /// object store first and referenced via `detailsKey`; a failed blob
    /// write downgrades to an entry without details rather than failing.
    ///
    /// # Returns
    /// Ok(execution id) of the stored entry
    async fn append_or_update_log_entry(
        &self,
        key: &TaskKey,
        entry: ExecutionLogEntry,
        details: Option<Value>,
    ) -> Result<ExecutionId>;
}
