use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use embedflow_domain::error::{Error, Result};
use embedflow_domain::ports::providers::{QueueMessage, QueueProvider};

#[derive(Debug, Clone)]
struct PendingMessage {
    id: String,
    body: String,
}

/// In-memory queue with at-least-once semantics: received messages stay in
/// flight until acked; a nack (or a dropped consumer re-seeding via nack)
/// returns them for redelivery with a fresh receipt handle.
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    pending: Mutex<VecDeque<PendingMessage>>,
    in_flight: DashMap<String, PendingMessage>,
    sequence: AtomicU64,
}

impl InMemoryQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages waiting for delivery. Test support.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.lock().map(|queue| queue.len()).unwrap_or(0)
    }

    /// Number of deliveries awaiting ack. Test support.
    #[must_use]
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl QueueProvider for InMemoryQueue {
    async fn send(&self, body: String) -> Result<String> {
        let id = format!("m-{}", self.next_sequence());
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| Error::queue("queue lock poisoned"))?;
        pending.push_back(PendingMessage {
            id: id.clone(),
            body,
        });
        Ok(id)
    }

    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| Error::queue("queue lock poisoned"))?;
        let mut received = Vec::new();
        while received.len() < max {
            let Some(message) = pending.pop_front() else {
                break;
            };
            let receipt_handle = format!("r-{}", self.next_sequence());
            self.in_flight.insert(receipt_handle.clone(), message.clone());
            received.push(QueueMessage {
                id: message.id,
                receipt_handle,
                body: message.body,
            });
        }
        Ok(received)
    }

    async fn ack(&self, receipt_handle: &str) -> Result<()> {
        self.in_flight
            .remove(receipt_handle)
            .map(|_| ())
            .ok_or_else(|| Error::queue(format!("unknown receipt handle {receipt_handle}")))
    }

    async fn nack(&self, receipt_handle: &str) -> Result<()> {
        let (_, message) = self
            .in_flight
            .remove(receipt_handle)
            .ok_or_else(|| Error::queue(format!("unknown receipt handle {receipt_handle}")))?;
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| Error::queue("queue lock poisoned"))?;
        pending.push_front(message);
        Ok(())
    }
}
