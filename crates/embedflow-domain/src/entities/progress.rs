//! Document progress records and the two-level status machine.
//!
//! Status is tracked at two levels:
//! 1. Parent status - the overall document processing status
//! 2. Child status - the status of each individual child chunk
//!
//! Terminal states (`completed`, `failed`) are absorbing at both levels.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::value_objects::ChildChunkId;

/// Lifecycle status of one child chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum ChildStatus {
    /// Initial state when the chunk is submitted for embedding
    #[display("starting")]
    Starting,
    /// Chunk is actively being processed
    #[display("processing")]
    Processing,
    /// Chunk has been successfully processed
    #[display("completed")]
    Completed,
    /// Chunk processing encountered an error
    #[display("failed")]
    Failed,
}

impl ChildStatus {
    /// Returns `true` if the status is terminal (absorbing).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns `true` if moving to `next` follows a legal edge:
    /// `starting → {processing, failed}`, `processing → {completed, failed}`.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        match self {
            Self::Starting => matches!(next, Self::Processing | Self::Failed),
            Self::Processing => matches!(next, Self::Completed | Self::Failed),
            Self::Completed | Self::Failed => false,
        }
    }
}

/// Lifecycle status of a whole document, derived from its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum ParentStatus {
    /// Document submitted, no child has reported yet
    #[display("starting")]
    Starting,
    /// At least one child chunk is in flight
    #[display("processing")]
    Processing,
    /// Every child chunk completed
    #[display("completed")]
    Completed,
    /// At least one child chunk failed
    #[display("failed")]
    Failed,
}

impl ParentStatus {
    /// Returns `true` if the status is terminal (absorbing).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Aggregate the parent status from child statuses: `failed` if any
    /// child failed, `completed` if all children completed, otherwise
    /// `processing`.
    pub fn aggregate<I>(children: I) -> Self
    where
        I: IntoIterator<Item = ChildStatus>,
    {
        let mut any_failed = false;
        let mut all_completed = true;
        for status in children {
            if status == ChildStatus::Failed {
                any_failed = true;
            }
            if status != ChildStatus::Completed {
                all_completed = false;
            }
        }
        if any_failed {
            Self::Failed
        } else if all_completed {
            Self::Completed
        } else {
            Self::Processing
        }
    }
}

/// Progress entry for one child chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildProgress {
    /// Current status
    pub status: ChildStatus,
    /// When this entry was last written
    pub last_updated: DateTime<Utc>,
    /// Monotonic write counter for this child
    pub version: u64,
    /// Error string when the chunk failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Child-chunk map and structural metadata of a progress record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressData {
    /// Expected number of child chunks (written by the chunker)
    #[serde(default)]
    pub total_chunks: usize,
    /// Per-child progress keyed by chunk ordinal
    #[serde(default)]
    pub child_chunks: BTreeMap<ChildChunkId, ChildProgress>,
}

/// The single coordination object per document.
///
/// Shared between all workers processing the document; every status write
/// is conditional on the current state not being terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// Aggregated document status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_chunk_status: Option<ParentStatus>,
    /// Operator kill switch; workers drop messages when set
    #[serde(default)]
    pub terminated: bool,
    /// Error string when the parent was forced to `failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When the record was last written
    pub last_updated: DateTime<Utc>,
    /// Child-chunk map and structural metadata
    #[serde(default)]
    pub data: ProgressData,
}

impl ProgressRecord {
    /// Fresh record with an empty child map.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            parent_chunk_status: None,
            terminated: false,
            error_message: None,
            last_updated: now,
            data: ProgressData::default(),
        }
    }

    /// Returns `true` if the parent status is terminal or the record is
    /// terminated.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminated
            || self
                .parent_chunk_status
                .is_some_and(|status| status.is_terminal())
    }

    /// Status of one child chunk, if present.
    #[must_use]
    pub fn child_status(&self, chunk: &ChildChunkId) -> Option<ChildStatus> {
        self.data.child_chunks.get(chunk).map(|entry| entry.status)
    }

    /// Aggregate the parent status from the current child map.
    ///
    /// A record seeded with an expected chunk count stays `processing`
    /// until every expected child has reported: without that, the first
    /// child to complete would flip the whole document to `completed` and
    /// the terminal check would drop its siblings' messages.
    #[must_use]
    pub fn aggregate_parent_status(&self) -> ParentStatus {
        let aggregated =
            ParentStatus::aggregate(self.data.child_chunks.values().map(|entry| entry.status));
        if aggregated == ParentStatus::Completed
            && self.data.total_chunks > self.data.child_chunks.len()
        {
            return ParentStatus::Processing;
        }
        aggregated
    }

    /// Child chunk ids whose status is not `completed` (reprocess targets).
    #[must_use]
    pub fn incomplete_children(&self) -> Vec<ChildChunkId> {
        self.data
            .child_chunks
            .iter()
            .filter(|(_, entry)| entry.status != ChildStatus::Completed)
            .map(|(id, _)| id.clone())
            .collect()
    }
}
