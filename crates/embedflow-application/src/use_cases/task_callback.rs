//! Task Callback Sink Use Case
//!
//! # Overview
//! Reconciles agent success/failure events back into the task's execution
//! log: the log entry keyed by the run's execution id is merged in place
//! (preserving its `startTime`), the claim markers are cleared so the task
//! becomes eligible on its next cron fire, and optional email
//! notifications go out. Notification and archival failures are logged,
//! never propagated - reconciliation must always finish.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use embedflow_domain::constants::scheduling::SCHEDULED_TASK_SOURCE;
use embedflow_domain::entities::{ExecutionLogEntry, ExecutionStatus, ScheduledTask};
use embedflow_domain::error::Result;
use embedflow_domain::events::{DomainEvent, EventBusProvider};
use embedflow_domain::ports::providers::{MailerProvider, TaskRepository};
use embedflow_domain::value_objects::ExecutionId;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

/// The task payload as it came back from the agent runtime: the stored
/// task fields plus the dispatch-time additions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchedTask {
    /// The task definition
    #[serde(flatten)]
    pub task: ScheduledTask,
    /// Execution id assigned at dispatch
    #[serde(default)]
    pub session_id: Option<ExecutionId>,
    /// Source tag stamped at dispatch
    #[serde(default)]
    pub source: Option<String>,
}

impl DispatchedTask {
    /// The run's execution id, reconstructed best-effort from the task id
    /// and `now` when the event lost it.
    fn execution_id(&self, now: DateTime<Utc>) -> ExecutionId {
        self.session_id
            .clone()
            .unwrap_or_else(|| ExecutionId::for_task(&self.task.task_id, now))
    }

    fn is_scheduled(&self) -> bool {
        self.source.as_deref() == Some(SCHEDULED_TASK_SOURCE)
    }
}

/// Callback sink over the task registry and the mailer.
pub struct TaskCallbackSink {
    repository: Arc<dyn TaskRepository>,
    mailer: Arc<dyn MailerProvider>,
    event_bus: Arc<dyn EventBusProvider>,
}

impl TaskCallbackSink {
    /// Create the sink with injected dependencies.
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        mailer: Arc<dyn MailerProvider>,
        event_bus: Arc<dyn EventBusProvider>,
    ) -> Self {
        Self {
            repository,
            mailer,
            event_bus,
        }
    }

    /// Agent success callback.
    ///
    /// # Errors
    ///
    /// Returns an error only when the log write fails; notifications and
    /// claim clearing degrade to warnings.
    pub async fn on_success(&self, dispatched: &DispatchedTask, result: Value) -> Result<()> {
        let now = Utc::now();
        let key = dispatched.task.key();
        let execution_id = dispatched.execution_id(now);
        info!(task = %key, execution = %execution_id, "Task completed");

        self.repository
            .append_or_update_log_entry(
                &key,
                ExecutionLogEntry {
                    execution_id: execution_id.clone(),
                    executed_at: now,
                    status: ExecutionStatus::Success,
                    source: dispatched.source.clone().unwrap_or_default(),
                    start_time: None,
                    details_key: None,
                },
                Some(json!({
                    "result": result,
                    "completedAt": now.to_rfc3339(),
                    "source": dispatched.source,
                })),
            )
            .await?;

        if dispatched.is_scheduled() {
            if let Err(e) = self.repository.clear_claim(&key, None).await {
                warn!(task = %key, error = %e, "Failed to clear claim markers");
            }
        }

        if dispatched.task.notify_on_completion {
            let body = format!(
                "SCHEDULED TASK COMPLETION: {}\n\nA scheduled task has completed successfully.\n\n{}\n\nRun Details:\n{}\n",
                dispatched.task.task_name,
                dispatched.task.detail_message(),
                result,
            );
            let subject = format!("Scheduled Task Completion: {}", dispatched.task.task_name);
            self.notify(&dispatched.task, &subject, &body).await;
        }

        if let Err(e) = self
            .event_bus
            .publish_event(DomainEvent::TaskCompleted {
                task: key,
                execution_id,
            })
            .await
        {
            warn!(error = %e, "Failed to publish completion event");
        }
        Ok(())
    }

    /// Agent failure callback.
    ///
    /// # Errors
    ///
    /// Returns an error only when the log write fails; notifications and
    /// claim clearing degrade to warnings.
    pub async fn on_failure(&self, dispatched: &DispatchedTask, error: String) -> Result<()> {
        let now = Utc::now();
        let key = dispatched.task.key();
        let execution_id = dispatched.execution_id(now);
        warn!(task = %key, execution = %execution_id, error = %error, "Task failed");

        self.repository
            .append_or_update_log_entry(
                &key,
                ExecutionLogEntry {
                    execution_id: execution_id.clone(),
                    executed_at: now,
                    status: ExecutionStatus::Failure,
                    source: dispatched.source.clone().unwrap_or_default(),
                    start_time: None,
                    details_key: None,
                },
                Some(json!({
                    "message": error,
                    "error": "Agent failed to execute task",
                    "failedAt": now.to_rfc3339(),
                    "source": dispatched.source,
                })),
            )
            .await?;

        if dispatched.is_scheduled() {
            // Clear the claim so the next cron fire retries the task.
            if let Err(e) = self.repository.clear_claim(&key, None).await {
                warn!(task = %key, error = %e, "Failed to clear claim markers");
            }
        }

        if dispatched.task.notify_on_failure {
            let body = format!(
                "SCHEDULED TASK FAILURE: {}\n\nA scheduled task has failed and requires attention.\n\n{}\n\nFAILURE TIME: {}\n\nERROR DETAILS:\n{}\n",
                dispatched.task.task_name,
                dispatched.task.detail_message(),
                now.format("%Y-%m-%d %H:%M:%S"),
                error,
            );
            let subject = format!("Scheduled Task Failure: {}", dispatched.task.task_name);
            self.notify(&dispatched.task, &subject, &body).await;
        }

        if let Err(e) = self
            .event_bus
            .publish_event(DomainEvent::TaskFailed { task: key, error })
            .await
        {
            warn!(error = %e, "Failed to publish failure event");
        }
        Ok(())
    }

    /// Per-address send with logged failures.
    async fn notify(&self, task: &ScheduledTask, subject: &str, body: &str) {
        for address in &task.notify_email_addresses {
            let address = address.trim();
            if address.is_empty() {
                continue;
            }
            if let Err(e) = self.mailer.send(address, subject, body).await {
                warn!(to = %address, error = %e, "Failed to send task notification");
            }
        }
    }
}
