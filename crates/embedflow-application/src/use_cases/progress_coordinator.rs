//! Progress Coordinator Use Case
//!
//! # Overview
//! Maintains the per-document progress record: per-child status, aggregated
//! parent status, and the termination flag. All writes go through the
//! store's compare-and-set operations, so terminal states are absorbing no
//! matter how workers interleave.
//!
//! # Race discipline
//! Two workers may attempt the same transition; the store condition makes
//! exactly one write apply. Lost races and illegal transitions are logged
//! and swallowed - they are expected outcomes of at-least-once delivery,
//! not errors. A child failure eagerly forces the parent to `failed` in the
//! same logical step so remaining children stop doing useless work.

use std::sync::Arc;

use embedflow_domain::entities::{ChildStatus, ParentStatus};
use embedflow_domain::error::{Error, Result};
use embedflow_domain::events::{DomainEvent, EventBusProvider};
use embedflow_domain::ports::providers::ProgressStore;
use embedflow_domain::value_objects::{ChildChunkId, DocumentKey};
use tracing::{debug, info, warn};

/// Coordinator over the progress store.
pub struct ProgressCoordinator {
    store: Arc<dyn ProgressStore>,
    event_bus: Arc<dyn EventBusProvider>,
}

impl ProgressCoordinator {
    /// Create a coordinator with injected dependencies.
    pub fn new(store: Arc<dyn ProgressStore>, event_bus: Arc<dyn EventBusProvider>) -> Self {
        Self { store, event_bus }
    }

    async fn publish(&self, event: DomainEvent) {
        if let Err(e) = self.event_bus.publish_event(event).await {
            warn!(error = %e, "Failed to publish progress event");
        }
    }

    /// Update one child's status, enforcing legal transitions.
    ///
    /// Terminal current states and illegal transitions are no-ops (logged);
    /// a lost conditional write is tolerated silently.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store itself fails.
    pub async fn update_child_status(
        &self,
        key: &DocumentKey,
        chunk: &ChildChunkId,
        new_status: ChildStatus,
        error: Option<String>,
    ) -> Result<()> {
        let current = self
            .store
            .get(key, true)
            .await?
            .and_then(|record| record.child_status(chunk));

        if let Some(current) = current {
            if current.is_terminal() {
                warn!(
                    document = %key,
                    chunk = %chunk,
                    current = %current,
                    requested = %new_status,
                    "Child already terminal, skipping update"
                );
                return Ok(());
            }
            if !current.can_transition_to(new_status) {
                warn!(
                    document = %key,
                    chunk = %chunk,
                    current = %current,
                    requested = %new_status,
                    "Illegal child transition, skipping update"
                );
                return Ok(());
            }
        }

        let outcome = self
            .store
            .write_child_status(key, chunk, new_status, error)
            .await?;
        if !outcome.applied() {
            info!(
                document = %key,
                chunk = %chunk,
                requested = %new_status,
                "Lost child status race to a terminal write"
            );
        }
        Ok(())
    }

    /// Update the parent status. With `status` omitted, aggregates from the
    /// children: `failed` if any child failed, `completed` if all children
    /// completed, `processing` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error when the store fails, or when aggregation is
    /// requested for a document with no progress record.
    pub async fn update_parent_status(
        &self,
        key: &DocumentKey,
        status: Option<ParentStatus>,
        error: Option<String>,
    ) -> Result<()> {
        let new_status = match status {
            Some(status) => status,
            None => {
                // Strong-consistent read: aggregation must see the write
                // the completing child just made.
                let record = self
                    .store
                    .get(key, true)
                    .await?
                    .ok_or_else(|| Error::not_found(format!("progress record {key}")))?;

                if record
                    .parent_chunk_status
                    .is_some_and(|current| current.is_terminal())
                {
                    debug!(document = %key, "Parent already terminal, skipping aggregation");
                    return Ok(());
                }
                record.aggregate_parent_status()
            }
        };

        let outcome = self
            .store
            .write_parent_status(key, new_status, error.clone())
            .await?;
        if !outcome.applied() {
            info!(
                document = %key,
                requested = %new_status,
                "Lost parent status race to a terminal write"
            );
            return Ok(());
        }

        match new_status {
            ParentStatus::Completed => {
                info!(document = %key, "Document embedding completed");
                self.publish(DomainEvent::DocumentCompleted {
                    document: key.clone(),
                })
                .await;
            }
            ParentStatus::Failed => {
                warn!(document = %key, error = ?error, "Document embedding failed");
                self.publish(DomainEvent::DocumentFailed {
                    document: key.clone(),
                    error: error.unwrap_or_default(),
                })
                .await;
            }
            ParentStatus::Processing | ParentStatus::Starting => {
                debug!(document = %key, status = %new_status, "Parent status updated");
            }
        }
        Ok(())
    }

    /// Mark one child failed and eagerly force the parent to `failed`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store fails.
    pub async fn fail_child(
        &self,
        key: &DocumentKey,
        chunk: &ChildChunkId,
        error: String,
    ) -> Result<()> {
        self.update_child_status(key, chunk, ChildStatus::Failed, Some(error.clone()))
            .await?;
        self.update_parent_status(key, Some(ParentStatus::Failed), Some(error.clone()))
            .await?;
        self.publish(DomainEvent::ChildFailed {
            document: key.clone(),
            chunk: chunk.clone(),
            error,
        })
        .await;
        Ok(())
    }

    /// Status of one child chunk, if the record and the entry exist.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store fails.
    pub async fn child_status(
        &self,
        key: &DocumentKey,
        chunk: &ChildChunkId,
    ) -> Result<Option<ChildStatus>> {
        Ok(self
            .store
            .get(key, true)
            .await?
            .and_then(|record| record.child_status(chunk)))
    }

    /// Whether the document is terminal: parent status terminal or the
    /// termination flag set. Missing records are not terminal.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store fails.
    pub async fn is_terminal(&self, key: &DocumentKey) -> Result<bool> {
        Ok(self
            .store
            .get(key, true)
            .await?
            .is_some_and(|record| record.is_terminal()))
    }

    /// Operator kill switch.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store fails.
    pub async fn mark_terminated(&self, key: &DocumentKey) -> Result<bool> {
        info!(document = %key, "Terminating embedding process");
        self.store.set_terminated(key).await
    }

    /// Delete the progress record (full cleanup path).
    ///
    /// # Errors
    ///
    /// Returns an error only when the store fails.
    pub async fn reset(&self, key: &DocumentKey) -> Result<()> {
        self.store.delete(key).await
    }
}
