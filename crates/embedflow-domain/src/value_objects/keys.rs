//! Strong-typed keys for all domain entities.
//!
//! Document and task keys are opaque strings assigned by upstream services;
//! only the scheduler run id is generated locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

define_key!(
    DocumentKey,
    "Document identifier: the source key trimmed at the first `.json`"
);
define_key!(
    ChildChunkId,
    "Identifier of one child chunk within a document (stringified ordinal)"
);
define_key!(UserId, "Identifier of the user owning a scheduled task");
define_key!(TaskId, "Identifier of a scheduled task");
define_key!(
    ExecutionId,
    "Session-scoped identifier of a single task execution"
);

impl DocumentKey {
    /// Derive the document key from a raw source key by trimming everything
    /// after the first `.json`.
    ///
    /// `"docs/report.json-3.chunks.json"` and `"docs/report.json"` both map
    /// to `"docs/report.json"`. A source without `.json` is used verbatim.
    #[must_use]
    pub fn from_src(src: &str) -> Self {
        match src.split_once(".json") {
            Some((head, _)) => Self::new(format!("{head}.json")),
            None => Self::new(src),
        }
    }
}

impl ChildChunkId {
    /// Extract the child chunk ordinal from an object key of the form
    /// `<doc>.json-<k>...`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key carries no `.json-<digits>` segment.
    pub fn from_object_key(key: &str) -> Result<Self> {
        let (_, rest) = key.split_once(".json-").ok_or_else(|| {
            Error::invalid_argument(format!("no child chunk number in object key '{key}'"))
        })?;
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(Error::invalid_argument(format!(
                "no child chunk number in object key '{key}'"
            )));
        }
        Ok(Self::new(digits))
    }

    /// The chunk ordinal as an integer, when the id is numeric.
    #[must_use]
    pub fn ordinal(&self) -> Option<u32> {
        self.as_str().parse().ok()
    }
}

impl ExecutionId {
    /// Build the session-scoped execution id for a task run:
    /// `scheduled-task-<taskId>-<YYYYMMDDHHMMSS>`.
    #[must_use]
    pub fn for_task(task_id: &TaskId, at: DateTime<Utc>) -> Self {
        Self::new(format!(
            "scheduled-task-{task_id}-{}",
            at.format("%Y%m%d%H%M%S")
        ))
    }
}

/// Composite key of a scheduled task: `(user, taskId)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskKey {
    /// Owning user
    pub user: UserId,
    /// Task identifier
    pub task_id: TaskId,
}

impl TaskKey {
    /// Create a new task key.
    pub fn new(user: impl Into<UserId>, task_id: impl Into<TaskId>) -> Self {
        Self {
            user: user.into(),
            task_id: task_id.into(),
        }
    }
}

impl std::fmt::Display for TaskKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user, self.task_id)
    }
}

/// Identifier of one scheduler tick, stamped onto every claim it wins.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    derive_more::Display,
    Serialize,
    Deserialize,
)]
#[display("{_0}")]
pub struct RunId(uuid::Uuid);

impl RunId {
    /// Generate a fresh run id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Hyphenated string form (allocates).
    #[must_use]
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}
