//! Service interfaces implemented by the application layer.

use std::collections::HashMap;

use async_trait::async_trait;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::ParentStatus;
use crate::error::Result;

/// One data source in a status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceRef {
    /// User-facing key of the data source
    pub key: String,
    /// MIME type of the data source
    #[serde(rename = "type", default)]
    pub mime_type: String,
}

/// User-visible embedding status of a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingStatus {
    /// Submitted, no progress yet
    #[display("starting")]
    Starting,
    /// Actively being processed
    #[display("processing")]
    Processing,
    /// All chunks processed
    #[display("completed")]
    Completed,
    /// Processing encountered an error
    #[display("failed")]
    Failed,
    /// Operator terminated processing
    #[display("terminated")]
    Terminated,
    /// No record found for the key
    #[display("not_found")]
    NotFound,
}

impl From<ParentStatus> for EmbeddingStatus {
    fn from(status: ParentStatus) -> Self {
        match status {
            ParentStatus::Starting => Self::Starting,
            ParentStatus::Processing => Self::Processing,
            ParentStatus::Completed => Self::Completed,
            ParentStatus::Failed => Self::Failed,
        }
    }
}

/// Per-key status map. `None` marks a lookup that failed partially;
/// partial failures never become a global error.
pub type StatusMap = HashMap<String, Option<EmbeddingStatus>>;

/// Parallel embedding-status lookup across many data sources.
#[async_trait]
pub trait StatusQueryInterface: Send + Sync {
    /// Look up the status of each data source.
    ///
    /// # Returns
    /// Ok(map) from the original user-facing key to its status
    async fn get_status(&self, sources: Vec<DataSourceRef>) -> Result<StatusMap>;
}

/// Body of a scheduler tick report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickBody {
    /// Human-readable summary
    pub message: String,
    /// Number of tasks claimed this tick
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_count: Option<usize>,
    /// Number of tasks successfully dispatched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successful: Option<usize>,
    /// Number of tasks that failed to dispatch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<usize>,
    /// Per-task dispatch details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Return payload of one scheduler tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerTickReport {
    /// 200 on success, 500 on tick failure
    pub status_code: u16,
    /// Tick summary
    pub body: TickBody,
}

/// The scheduler control loop: scan, project, claim, dispatch.
#[async_trait]
pub trait SchedulerInterface: Send + Sync {
    /// Run one tick. Never returns an error; failures are reported in the
    /// tick payload.
    async fn tick(&self) -> SchedulerTickReport;
}
