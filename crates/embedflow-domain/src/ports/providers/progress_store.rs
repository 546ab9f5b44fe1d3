use async_trait::async_trait;

use crate::entities::{ChildStatus, ParentStatus, ProgressRecord};
use crate::error::Result;
use crate::ports::cas::CasOutcome;
use crate::value_objects::{ChildChunkId, DocumentKey};

/// Progress record coordination store.
///
/// One record per document, shared between all workers processing it. Both
/// status writes are compare-and-set: the condition is always "the current
/// status attribute does not exist OR is non-terminal", so a terminal
/// status can never be overwritten regardless of writer interleaving.
/// Higher-level transition legality (`starting → processing` etc.) is the
/// progress coordinator's concern, not the store's.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Read a progress record.
    ///
    /// # Arguments
    /// * `key` - document key
    /// * `consistent` - require a strongly consistent read where the
    ///   backend distinguishes
    async fn get(&self, key: &DocumentKey, consistent: bool) -> Result<Option<ProgressRecord>>;

    /// Replace (or create) a whole record. Used by seeding and tests; the
    /// pipeline itself only writes through the conditional operations.
    async fn put(&self, key: &DocumentKey, record: ProgressRecord) -> Result<()>;

    /// Conditionally write one child's status.
    ///
    /// Creates the record and the child-chunk structure if absent
    /// (idempotent), bumps the child's `version`, stamps `lastUpdated`.
    /// Condition: the child's status attribute does not exist OR is
    /// non-terminal.
    ///
    /// # Returns
    /// Ok(outcome) - `ConditionFailed` when the child is already terminal
    async fn write_child_status(
        &self,
        key: &DocumentKey,
        chunk: &ChildChunkId,
        status: ChildStatus,
        error: Option<String>,
    ) -> Result<CasOutcome>;

    /// Conditionally write the parent status.
    ///
    /// Creates the record if absent, stamps `lastUpdated`, and stores the
    /// error message when `status` is `failed`. Condition: the parent
    /// status attribute does not exist OR is non-terminal.
    ///
    /// # Returns
    /// Ok(outcome) - `ConditionFailed` when the parent is already terminal
    async fn write_parent_status(
        &self,
        key: &DocumentKey,
        status: ParentStatus,
        error: Option<String>,
    ) -> Result<CasOutcome>;

    /// Operator kill switch: set `terminated = true` on the record,
    /// creating the record when absent.
    ///
    /// # Returns
    /// Ok(true) once the flag is set
    async fn set_terminated(&self, key: &DocumentKey) -> Result<bool>;

    /// Delete the record entirely. Used by the reprocess planner's full
    /// cleanup.
    async fn delete(&self, key: &DocumentKey) -> Result<()>;
}
