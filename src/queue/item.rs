//! Queue Item Module
//!
//! Defines queue items, their priority bands, and status lifecycle.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::cache::current_timestamp_ms;

// == Priority ==
/// Priority band for queue ordering. Higher bands are always dequeued
/// before lower ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

// == Item Status ==
/// Lifecycle state of a queue item.
///
/// `Dead` is terminal: the item exhausted its retry budget and is never
/// redelivered, only surfaced through stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Dead,
}

// == Queue Item ==
/// A single unit of work on a named queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    /// Unique item identifier
    pub id: Uuid,
    /// Queue this item belongs to
    pub queue_name: String,
    /// Caller-supplied payload
    pub payload: Value,
    pub priority: Priority,
    pub status: ItemStatus,
    /// Number of failed attempts so far
    pub attempt_count: u32,
    /// Retry budget; reaching it moves the item to `Dead`
    pub max_attempts: u32,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// When a failed item becomes eligible again (Unix milliseconds)
    pub next_retry_at: Option<u64>,
    /// Most recent failure description
    pub last_error: Option<String>,
    /// Enqueue order within the queue; breaks priority ties even when
    /// created_at timestamps collide at millisecond resolution
    #[serde(skip)]
    pub(crate) sequence: u64,
}

impl QueueItem {
    // == Constructor ==
    /// Creates a pending item.
    pub fn new(
        queue_name: String,
        payload: Value,
        priority: Priority,
        max_attempts: u32,
        sequence: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            queue_name,
            payload,
            priority,
            status: ItemStatus::Pending,
            attempt_count: 0,
            max_attempts,
            created_at: current_timestamp_ms(),
            next_retry_at: None,
            last_error: None,
            sequence,
        }
    }

    /// True once the item can never change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, ItemStatus::Completed | ItemStatus::Dead)
    }

    /// True when the item may be handed to a consumer: pending, or failed
    /// with its retry delay elapsed.
    pub fn is_eligible(&self, now: u64) -> bool {
        match self.status {
            ItemStatus::Pending => true,
            ItemStatus::Failed => match self.next_retry_at {
                Some(due) => now >= due,
                None => true,
            },
            _ => false,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
    }

    #[test]
    fn test_priority_serde_names() {
        assert_eq!(serde_json::to_string(&Priority::Critical).unwrap(), "\"critical\"");
        let parsed: Priority = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(parsed, Priority::High);
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&ItemStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }

    #[test]
    fn test_new_item_is_pending() {
        let item = QueueItem::new("jobs".to_string(), json!({"n": 1}), Priority::Normal, 3, 0);

        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.attempt_count, 0);
        assert!(item.next_retry_at.is_none());
        assert!(item.last_error.is_none());
        assert!(!item.is_terminal());
        assert!(item.is_eligible(current_timestamp_ms()));
    }

    #[test]
    fn test_failed_item_eligibility_honors_retry_time() {
        let mut item = QueueItem::new("jobs".to_string(), json!(1), Priority::Normal, 3, 0);
        let now = current_timestamp_ms();

        item.status = ItemStatus::Failed;
        item.next_retry_at = Some(now + 5000);
        assert!(!item.is_eligible(now));
        assert!(item.is_eligible(now + 5000));
    }

    #[test]
    fn test_terminal_items_are_never_eligible() {
        let mut item = QueueItem::new("jobs".to_string(), json!(1), Priority::Critical, 3, 0);
        let now = current_timestamp_ms();

        item.status = ItemStatus::Completed;
        assert!(item.is_terminal());
        assert!(!item.is_eligible(now));

        item.status = ItemStatus::Dead;
        assert!(item.is_terminal());
        assert!(!item.is_eligible(now));
    }
}
