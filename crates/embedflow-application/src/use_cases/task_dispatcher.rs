//! Task Dispatcher Use Case
//!
//! # Overview
//! Hands claimed tasks to the agent queue: resolves the task's API key,
//! packages a session-scoped execution request, enqueues it, and records a
//! `running` log entry keyed by the execution id. Credential failures and
//! enqueue failures each record a `failure` entry; the claim is never
//! released here - the cron arithmetic of a later tick retries the task.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use embedflow_domain::constants::scheduling::SCHEDULED_TASK_SOURCE;
use embedflow_domain::entities::{ExecutionLogEntry, ExecutionStatus, ScheduledTask};
use embedflow_domain::error::{Error, Result};
use embedflow_domain::events::{DomainEvent, EventBusProvider};
use embedflow_domain::ports::providers::{ApiKeyResolver, QueueProvider, TaskRepository};
use embedflow_domain::value_objects::ExecutionId;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Per-tick dispatch summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchOutcome {
    /// `{taskId, messageId}` per dispatched task
    pub successful: Vec<Value>,
    /// `{taskId, userId, error, ...}` per failed task
    pub failed: Vec<Value>,
}

/// Dispatcher over the agent queue.
pub struct TaskDispatcher {
    repository: Arc<dyn TaskRepository>,
    api_keys: Arc<dyn ApiKeyResolver>,
    agent_queue: Arc<dyn QueueProvider>,
    event_bus: Arc<dyn EventBusProvider>,
}

impl TaskDispatcher {
    /// Create a dispatcher with injected dependencies.
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        api_keys: Arc<dyn ApiKeyResolver>,
        agent_queue: Arc<dyn QueueProvider>,
        event_bus: Arc<dyn EventBusProvider>,
    ) -> Self {
        Self {
            repository,
            api_keys,
            agent_queue,
            event_bus,
        }
    }

    /// Dispatch every claimed task, collecting per-task outcomes.
    pub async fn dispatch_all(&self, tasks: Vec<ScheduledTask>, now: DateTime<Utc>) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        for task in tasks {
            match self.dispatch_one(&task, now).await {
                Ok(message_id) => outcome.successful.push(json!({
                    "taskId": task.task_id.as_str(),
                    "messageId": message_id,
                })),
                Err(e) => outcome.failed.push(json!({
                    "taskId": task.task_id.as_str(),
                    "userId": task.user.as_str(),
                    "error": e.to_string(),
                    "failedAt": now.to_rfc3339(),
                })),
            }
        }
        outcome
    }

    async fn dispatch_one(&self, task: &ScheduledTask, now: DateTime<Utc>) -> Result<String> {
        let execution_id = ExecutionId::for_task(&task.task_id, now);

        let api_key = match self.resolve_key(task).await {
            Ok(api_key) => api_key,
            Err(e) => {
                warn!(task = %task.key(), error = %e, "API key resolution failed");
                self.record_failure(
                    task,
                    &execution_id,
                    now,
                    "Failed to get API key for task",
                    &e.to_string(),
                )
                .await;
                return Err(e);
            }
        };

        let envelope = build_envelope(task, &api_key, &execution_id)?;
        match self.agent_queue.send(envelope).await {
            Ok(message_id) => {
                info!(task = %task.key(), execution = %execution_id, "Task dispatched");
                self.record_running(task, &execution_id, now).await;
                if let Err(e) = self
                    .event_bus
                    .publish_event(DomainEvent::TaskDispatched {
                        task: task.key(),
                        execution_id: execution_id.clone(),
                    })
                    .await
                {
                    warn!(error = %e, "Failed to publish dispatch event");
                }
                Ok(message_id)
            }
            Err(e) => {
                warn!(task = %task.key(), error = %e, "Failed to send task to queue");
                self.record_failure(
                    task,
                    &execution_id,
                    now,
                    "Failed to send task to queue",
                    &e.to_string(),
                )
                .await;
                Err(e)
            }
        }
    }

    async fn resolve_key(&self, task: &ScheduledTask) -> Result<String> {
        let api_key_id = task
            .api_key_id
            .as_deref()
            .ok_or_else(|| Error::credential("task has no API key id"))?;
        let record = self.api_keys.resolve(api_key_id).await?;
        Ok(record.api_key)
    }

    async fn record_running(
        &self,
        task: &ScheduledTask,
        execution_id: &ExecutionId,
        now: DateTime<Utc>,
    ) {
        let entry = ExecutionLogEntry {
            execution_id: execution_id.clone(),
            executed_at: now,
            status: ExecutionStatus::Running,
            source: SCHEDULED_TASK_SOURCE.to_owned(),
            start_time: Some(now),
            details_key: None,
        };
        let details = json!({
            "sessionId": execution_id.as_str(),
            "startTime": now.to_rfc3339(),
            "source": SCHEDULED_TASK_SOURCE,
        });
        if let Err(e) = self
            .repository
            .append_or_update_log_entry(&task.key(), entry, Some(details))
            .await
        {
            warn!(task = %task.key(), error = %e, "Failed to record running entry");
        }
    }

    async fn record_failure(
        &self,
        task: &ScheduledTask,
        execution_id: &ExecutionId,
        now: DateTime<Utc>,
        error: &str,
        message: &str,
    ) {
        let entry = ExecutionLogEntry {
            execution_id: execution_id.clone(),
            executed_at: now,
            status: ExecutionStatus::Failure,
            source: SCHEDULED_TASK_SOURCE.to_owned(),
            start_time: None,
            details_key: None,
        };
        let details = json!({
            "error": error,
            "message": message,
            "failedAt": now.to_rfc3339(),
            "source": SCHEDULED_TASK_SOURCE,
        });
        if let Err(e) = self
            .repository
            .append_or_update_log_entry(&task.key(), entry, Some(details))
            .await
        {
            warn!(task = %task.key(), error = %e, "Failed to record failure entry");
        }
    }
}

/// Build the agent queue envelope:
/// `{ source: "scheduled-task", taskData: { ...task, apiKey, source, sessionId } }`.
fn build_envelope(
    task: &ScheduledTask,
    api_key: &str,
    execution_id: &ExecutionId,
) -> Result<String> {
    let mut task_data = serde_json::to_value(task)?;
    if let Some(fields) = task_data.as_object_mut() {
        fields.insert("apiKey".to_owned(), json!(api_key));
        fields.insert("source".to_owned(), json!(SCHEDULED_TASK_SOURCE));
        fields.insert("sessionId".to_owned(), json!(execution_id.as_str()));
    }
    Ok(serde_json::to_string(&json!({
        "source": SCHEDULED_TASK_SOURCE,
        "taskData": task_data,
    }))?)
}
