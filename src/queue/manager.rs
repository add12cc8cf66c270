//! Queue Manager Module
//!
//! Named priority queues with retry/backoff and dead-lettering. Delivery is
//! at-least-once and best-effort: a consumer that stops without calling
//! `complete` or `fail` leaves its item `in_progress` until an external
//! reaper intervenes.
//!
//! Locking is per queue: operations on one queue are serialized to uphold
//! the priority/FIFO ordering contract; independent queues do not interact.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::cache::current_timestamp_ms;
use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::queue::{ItemStatus, Priority, QueueItem, QueueStats};

// == Queue Config ==
/// Retry backoff parameters shared by all queues.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Backoff base delay in milliseconds
    pub base_delay_ms: u64,
    /// Backoff cap in milliseconds
    pub max_delay_ms: u64,
}

impl QueueConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            max_delay_ms: 60_000,
        }
    }
}

// == Queue State ==
/// All items of one named queue, guarded by that queue's lock.
///
/// Terminal items are retained so stats reflect everything ever enqueued.
#[derive(Default)]
struct QueueState {
    items: HashMap<Uuid, QueueItem>,
    /// Monotonic enqueue counter used for FIFO tie-breaks
    next_sequence: u64,
}

// == Queue Manager ==
/// Manages independent named queues, created on first use.
pub struct QueueManager {
    queues: RwLock<HashMap<String, Arc<Mutex<QueueState>>>>,
    config: QueueConfig,
}

impl QueueManager {
    // == Constructor ==
    pub fn new(config: QueueConfig) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            config,
        }
    }

    // == Enqueue ==
    /// Adds a pending item and returns its id.
    ///
    /// # Arguments
    /// * `queue_name` - Target queue, created on first use
    /// * `payload` - Arbitrary work description
    /// * `priority` - Defaults to `Normal`
    /// * `max_attempts` - Retry budget, defaults to 3; must be at least 1
    pub async fn enqueue(
        &self,
        queue_name: &str,
        payload: Value,
        priority: Option<Priority>,
        max_attempts: Option<u32>,
    ) -> Result<Uuid> {
        if queue_name.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "Queue name cannot be empty".to_string(),
            ));
        }
        let max_attempts = max_attempts.unwrap_or(3);
        if max_attempts == 0 {
            return Err(ServiceError::InvalidRequest(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        let queue = self.queue(queue_name).await;
        let mut state = queue.lock().await;

        let sequence = state.next_sequence;
        state.next_sequence += 1;

        let item = QueueItem::new(
            queue_name.to_string(),
            payload,
            priority.unwrap_or_default(),
            max_attempts,
            sequence,
        );
        let id = item.id;
        state.items.insert(id, item);

        Ok(id)
    }

    // == Dequeue ==
    /// Hands out the next eligible item, or None when the queue is drained.
    ///
    /// Eligible items are `pending`, or `failed` with their retry delay
    /// elapsed. The highest priority wins; within a band, enqueue order.
    /// The returned item is marked `in_progress`.
    pub async fn dequeue(&self, queue_name: &str) -> Option<QueueItem> {
        let queue = self.existing_queue(queue_name).await?;
        let mut state = queue.lock().await;
        let now = current_timestamp_ms();

        let best_id = state
            .items
            .values()
            .filter(|item| item.is_eligible(now))
            .max_by_key(|item| (item.priority, Reverse(item.sequence)))
            .map(|item| item.id)?;

        let item = state.items.get_mut(&best_id)?;
        item.status = ItemStatus::InProgress;
        item.next_retry_at = None;
        Some(item.clone())
    }

    // == Complete ==
    /// Acknowledges successful processing of an `in_progress` item.
    ///
    /// Unknown ids, items in other states, and already-terminal items all
    /// report not-found; nothing changes in those cases.
    pub async fn complete(&self, queue_name: &str, id: Uuid) -> Result<()> {
        let queue = self
            .existing_queue(queue_name)
            .await
            .ok_or_else(|| ServiceError::NotFound(format!("Queue '{}' not found", queue_name)))?;
        let mut state = queue.lock().await;

        match state.items.get_mut(&id) {
            Some(item) if item.status == ItemStatus::InProgress => {
                item.status = ItemStatus::Completed;
                Ok(())
            }
            _ => Err(ServiceError::NotFound(format!(
                "No in-progress item '{}' on queue '{}'",
                id, queue_name
            ))),
        }
    }

    // == Fail ==
    /// Records a processing failure for an `in_progress` item.
    ///
    /// While attempts remain the item becomes `failed` with an exponential
    /// backoff delay; once the retry budget is exhausted it becomes `dead`
    /// and is never redelivered. Returns the new status.
    pub async fn fail(&self, queue_name: &str, id: Uuid, error: &str) -> Result<ItemStatus> {
        let queue = self
            .existing_queue(queue_name)
            .await
            .ok_or_else(|| ServiceError::NotFound(format!("Queue '{}' not found", queue_name)))?;
        let mut state = queue.lock().await;

        let item = match state.items.get_mut(&id) {
            Some(item) if item.status == ItemStatus::InProgress => item,
            _ => {
                return Err(ServiceError::NotFound(format!(
                    "No in-progress item '{}' on queue '{}'",
                    id, queue_name
                )))
            }
        };

        item.attempt_count += 1;
        item.last_error = Some(error.to_string());

        if item.attempt_count < item.max_attempts {
            item.status = ItemStatus::Failed;
            item.next_retry_at =
                Some(current_timestamp_ms() + self.backoff_delay_ms(item.attempt_count));
        } else {
            item.status = ItemStatus::Dead;
            item.next_retry_at = None;
            debug!(
                queue = queue_name,
                id = %id,
                attempts = item.attempt_count,
                "item exhausted its retry budget"
            );
        }
        Ok(item.status)
    }

    // == Promote Due Retries ==
    /// Flips `failed` items whose retry delay has elapsed back to `pending`
    /// across all queues, so stats reflect eligibility between dequeues.
    /// Returns the number promoted.
    pub async fn promote_due(&self) -> usize {
        let queues: Vec<Arc<Mutex<QueueState>>> = {
            let queues = self.queues.read().await;
            queues.values().cloned().collect()
        };

        let now = current_timestamp_ms();
        let mut promoted = 0usize;
        for queue in queues {
            let mut state = queue.lock().await;
            for item in state.items.values_mut() {
                if item.status == ItemStatus::Failed
                    && item.next_retry_at.map_or(true, |due| now >= due)
                {
                    item.status = ItemStatus::Pending;
                    item.next_retry_at = None;
                    promoted += 1;
                }
            }
        }
        promoted
    }

    // == Stats ==
    /// Returns per-status counts for one queue, or aggregated across all
    /// queues when `queue_name` is None. An unknown queue reports zeros.
    pub async fn stats(&self, queue_name: Option<&str>) -> QueueStats {
        let queues: Vec<(String, Arc<Mutex<QueueState>>)> = {
            let queues = self.queues.read().await;
            queues
                .iter()
                .map(|(name, queue)| (name.clone(), queue.clone()))
                .collect()
        };

        let mut stats = QueueStats::new();
        for (name, queue) in queues {
            if let Some(wanted) = queue_name {
                if name != wanted {
                    continue;
                }
            }
            let state = queue.lock().await;
            for item in state.items.values() {
                stats.count(item.status);
            }
        }
        stats
    }

    // == Backoff ==
    /// base_delay * 2^attempt_count, capped at the configured maximum.
    fn backoff_delay_ms(&self, attempt_count: u32) -> u64 {
        let factor = 1u64 << attempt_count.min(20);
        self.config
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.config.max_delay_ms)
    }

    // == Queue Lookup ==
    async fn queue(&self, name: &str) -> Arc<Mutex<QueueState>> {
        {
            let queues = self.queues.read().await;
            if let Some(queue) = queues.get(name) {
                return queue.clone();
            }
        }

        let mut queues = self.queues.write().await;
        queues
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(QueueState::default())))
            .clone()
    }

    /// Returns an existing queue without creating one.
    async fn existing_queue(&self, name: &str) -> Option<Arc<Mutex<QueueState>>> {
        let queues = self.queues.read().await;
        queues.get(name).cloned()
    }
}
