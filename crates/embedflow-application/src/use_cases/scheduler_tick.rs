//! Scheduler Tick Use Case
//!
//! # Overview
//! Runs on an external timer. Each tick scans the active tasks, projects
//! each task's cron expression through the owner's timezone, and attempts
//! an atomic claim of the earliest due instance. Claimed tasks are handed
//! to the dispatcher. Across concurrent ticks (clustered deployments) the
//! conditional claim guarantees at most one winner per due instance; lost
//! claims are skipped silently.
//!
//! Later due instances of the same task are deliberately left for the next
//! tick - one instance per tick is the back-pressure that prevents burst
//! fan-out after downtime.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use embedflow_domain::entities::ScheduledTask;
use embedflow_domain::events::{DomainEvent, EventBusProvider};
use embedflow_domain::ports::providers::TaskRepository;
use embedflow_domain::ports::services::{SchedulerInterface, SchedulerTickReport, TickBody};
use embedflow_domain::value_objects::RunId;
use tracing::{debug, info, warn};

use crate::scheduling::{due_instances, parse_timezone, within_date_range};
use crate::use_cases::task_dispatcher::TaskDispatcher;

/// Scheduler tick implementation.
pub struct SchedulerTick {
    repository: Arc<dyn TaskRepository>,
    dispatcher: Arc<TaskDispatcher>,
    event_bus: Arc<dyn EventBusProvider>,
    default_timezone: String,
}

impl SchedulerTick {
    /// Create the tick with injected dependencies. `default_timezone` is
    /// used when a task's timezone is absent or invalid.
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        dispatcher: Arc<TaskDispatcher>,
        event_bus: Arc<dyn EventBusProvider>,
        default_timezone: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            dispatcher,
            event_bus,
            default_timezone: default_timezone.into(),
        }
    }

    /// Claim every task with a due instance at `now`. Exposed with an
    /// explicit clock for tests; [`SchedulerInterface::tick`] stamps the
    /// wall clock.
    ///
    /// # Errors
    ///
    /// Returns an error when the active-task scan itself fails; per-task
    /// problems only skip that task.
    pub async fn claim_due_tasks(
        &self,
        now: DateTime<Utc>,
        run_id: &RunId,
    ) -> embedflow_domain::error::Result<Vec<ScheduledTask>> {
        let tasks = self.repository.list_active_tasks().await?;

        info!(run = %run_id, active = tasks.len(), "Scanning for due tasks");
        let mut claimed = Vec::new();

        for task in tasks {
            let key = task.key();
            if task.user.as_str().is_empty() || task.task_id.as_str().is_empty() {
                warn!("Skipping task with missing user or taskId");
                continue;
            }
            let Some(cron_expression) = task.cron_expression.as_deref() else {
                warn!(task = %key, "Active task has no cron expression, skipping");
                continue;
            };

            let tz = parse_timezone(task.time_zone.as_deref(), &self.default_timezone);

            match within_date_range(task.date_range.as_ref(), now, tz) {
                Ok(true) => {}
                Ok(false) => {
                    debug!(task = %key, "Outside date range, skipping");
                    continue;
                }
                Err(e) => {
                    warn!(task = %key, error = %e, "Date range parse failed, skipping");
                    continue;
                }
            }

            // Base time: last run, falling back to creation.
            let Some(base) = task.last_run_at.or(task.created_at) else {
                warn!(task = %key, "No lastRunAt or createdAt, skipping");
                continue;
            };

            let due = match due_instances(cron_expression, base, now, task.last_checked_at, tz) {
                Ok(due) => due,
                Err(e) => {
                    warn!(task = %key, error = %e, "Cron projection failed, skipping");
                    continue;
                }
            };
            let Some(earliest) = due.earliest() else {
                debug!(task = %key, "No due instances");
                continue;
            };
            if due.instances.len() > 1 {
                debug!(
                    task = %key,
                    pending = due.instances.len() - 1,
                    "Additional due instances left for later ticks"
                );
            }

            match self.repository.claim(&key, now, run_id, earliest).await {
                Ok(outcome) if outcome.applied() => {
                    info!(task = %key, due = %earliest, "Claimed due task instance");
                    if let Err(e) = self
                        .event_bus
                        .publish_event(DomainEvent::TaskClaimed {
                            task: key.clone(),
                            due_instance: earliest.to_rfc3339(),
                        })
                        .await
                    {
                        warn!(error = %e, "Failed to publish claim event");
                    }
                    claimed.push(task);
                }
                Ok(_) => {
                    debug!(task = %key, "Another tick already claimed this instance");
                }
                Err(e) => {
                    warn!(task = %key, error = %e, "Claim write failed, skipping");
                }
            }
        }

        info!(run = %run_id, claimed = claimed.len(), "Tick scan complete");
        Ok(claimed)
    }

    /// Run one full tick at an explicit time: claim then dispatch.
    pub async fn run_at(&self, now: DateTime<Utc>) -> SchedulerTickReport {
        let run_id = RunId::generate();
        let claimed = match self.claim_due_tasks(now, &run_id).await {
            Ok(claimed) => claimed,
            Err(e) => {
                warn!(run = %run_id, error = %e, "Tick failed to scan active tasks");
                return SchedulerTickReport {
                    status_code: 500,
                    body: TickBody {
                        message: format!("Error executing scheduled tasks: {e}"),
                        ..TickBody::default()
                    },
                };
            }
        };

        if claimed.is_empty() {
            return SchedulerTickReport {
                status_code: 200,
                body: TickBody {
                    message: "No tasks to execute".to_owned(),
                    tasks_count: Some(0),
                    ..TickBody::default()
                },
            };
        }

        let count = claimed.len();
        let outcome = self.dispatcher.dispatch_all(claimed, now).await;
        SchedulerTickReport {
            status_code: 200,
            body: TickBody {
                message: format!(
                    "Scheduled {} tasks for execution",
                    outcome.successful.len()
                ),
                tasks_count: Some(count),
                successful: Some(outcome.successful.len()),
                failed: Some(outcome.failed.len()),
                details: Some(serde_json::json!({
                    "successful": outcome.successful,
                    "failed": outcome.failed,
                })),
            },
        }
    }
}

#[async_trait]
impl SchedulerInterface for SchedulerTick {
    async fn tick(&self) -> SchedulerTickReport {
        self.run_at(Utc::now()).await
    }
}
