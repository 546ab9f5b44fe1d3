use async_trait::async_trait;

use crate::error::Result;

/// A received queue message. The receipt handle scopes the ack to this
/// delivery; a redelivered message carries a fresh handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Message identifier
    pub id: String,
    /// Delivery-scoped receipt handle
    pub receipt_handle: String,
    /// Raw message body
    pub body: String,
}

/// Queue with at-least-once delivery semantics.
///
/// Workers ack only after terminal handling (success, failed, or
/// terminal-parent-observed), so redelivery after a crash is correct. The
/// same trait fronts both the chunk ingestion queue and the agent queue.
#[async_trait]
pub trait QueueProvider: Send + Sync {
    /// Enqueue a message.
    ///
    /// # Returns
    /// Ok(message id) assigned by the queue
    async fn send(&self, body: String) -> Result<String>;

    /// Receive up to `max` messages. Received messages stay in flight until
    /// acked or nacked.
    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>>;

    /// Acknowledge (delete) a delivery.
    async fn ack(&self, receipt_handle: &str) -> Result<()>;

    /// Return a delivery to the queue for redelivery.
    async fn nack(&self, receipt_handle: &str) -> Result<()>;
}
