//! Scheduled tasks and their execution logs.

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value_objects::{ExecutionId, TaskId, TaskKey, UserId};

/// What kind of object a task executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
pub enum TaskType {
    /// Executes an assistant
    #[display("assistant")]
    Assistant,
    /// Executes a saved action set
    #[display("actionSet")]
    ActionSet,
    /// Executes a single API tool operation
    #[display("apiTool")]
    ApiTool,
}

impl TaskType {
    /// Human-readable label for notification bodies.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Assistant => "Assistant",
            Self::ActionSet => "Action Set",
            Self::ApiTool => "Api Tool",
        }
    }
}

/// Outcome of one task execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Execution dispatched and in flight
    #[display("running")]
    Running,
    /// Execution completed successfully
    #[display("success")]
    Success,
    /// Execution failed
    #[display("failure")]
    Failure,
    /// Execution timed out
    #[display("timeout")]
    Timeout,
}

/// Optional activity window of a task. Dates are kept as the raw strings
/// the user stored: either date-only (`YYYY-MM-DD`, interpreted at
/// user-local day boundaries) or a full datetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// Inclusive start of the window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Inclusive end of the window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// One entry in a task's execution log. Large detail payloads live in the
/// object store and are referenced by `details_key`; the entry itself only
/// carries metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLogEntry {
    /// Session-scoped execution id; the merge key within the log
    pub execution_id: ExecutionId,
    /// When the entry was written
    pub executed_at: DateTime<Utc>,
    /// Execution outcome
    pub status: ExecutionStatus,
    /// What produced this entry (e.g. `scheduled-task`)
    #[serde(default)]
    pub source: String,
    /// When the execution started; preserved across merges
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Object-store key of the detail payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details_key: Option<String>,
}

impl ExecutionLogEntry {
    /// Merge a newer entry for the same execution into this one, preserving
    /// the original `start_time` unless the newer entry is itself a
    /// `running` record.
    #[must_use]
    pub fn merged_with(&self, mut newer: Self) -> Self {
        if newer.status != ExecutionStatus::Running && newer.start_time.is_none() {
            newer.start_time = self.start_time;
        }
        newer
    }
}

/// A scheduled task definition, owned by its user. The scheduler performs
/// ephemeral claims via conditional updates on `last_checked_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTask {
    /// Owning user
    pub user: UserId,
    /// Task identifier
    pub task_id: TaskId,
    /// Display name
    #[serde(default)]
    pub task_name: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Five-field cron expression, interpreted in the user's timezone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_expression: Option<String>,
    /// IANA timezone name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    /// Optional activity window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    /// Whether the scheduler considers this task at all
    #[serde(default)]
    pub active: bool,
    /// When the task was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the task last ran (base time for cron projection)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    /// Claim marker: when a tick last claimed this task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Claim marker: which tick run claimed it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_run_id: Option<String>,
    /// Execution log, newest first
    #[serde(default)]
    pub logs: Vec<ExecutionLogEntry>,
    /// API key used to execute the task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_id: Option<String>,
    /// Opaque descriptor of the executed object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_info: Option<Value>,
    /// What kind of object the task executes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    /// Instructions handed to the agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_instructions: Option<String>,
    /// Send an email when an execution succeeds
    #[serde(default)]
    pub notify_on_completion: bool,
    /// Send an email when an execution fails
    #[serde(default)]
    pub notify_on_failure: bool,
    /// Notification recipients
    #[serde(default)]
    pub notify_email_addresses: Vec<String>,
}

impl ScheduledTask {
    /// Composite `(user, taskId)` key.
    #[must_use]
    pub fn key(&self) -> TaskKey {
        TaskKey {
            user: self.user.clone(),
            task_id: self.task_id.clone(),
        }
    }

    /// Task-details block used in notification emails.
    #[must_use]
    pub fn detail_message(&self) -> String {
        let type_label = self.task_type.map_or("Unknown Type", |t| t.title());
        let object_name = self
            .object_info
            .as_ref()
            .and_then(|info| info.get("objectName"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown Object");
        format!(
            "TASK DETAILS:\n- Task Name: {}\n- Description: {}\n- {}: {}",
            self.task_name,
            self.description.as_deref().unwrap_or("No description"),
            type_label,
            object_name,
        )
    }
}
