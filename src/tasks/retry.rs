//! Retry Promotion Task
//!
//! Background task that flips failed queue items back to pending once their
//! backoff delay elapses. Dequeue honors due retries on its own; the sweep
//! keeps queue stats reflecting eligibility between dequeues.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::queue::QueueManager;

/// Spawns a background task that periodically promotes due retries.
///
/// # Arguments
/// * `queue` - Shared queue manager
/// * `interval_secs` - Seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
pub fn spawn_retry_task(queue: Arc<QueueManager>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(interval_secs, "starting retry promotion task");

        loop {
            tokio::time::sleep(interval).await;

            let promoted = queue.promote_due().await;
            if promoted > 0 {
                info!(promoted, "promoted failed items for retry");
            } else {
                debug!("no retries due");
            }
        }
    })
}
