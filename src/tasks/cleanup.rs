//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries, so
//! expiry does not depend on keys being read again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// # Arguments
/// * `cache` - Shared cache store
/// * `interval_secs` - Seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
pub fn spawn_cleanup_task(cache: Arc<CacheStore>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(interval_secs, "starting TTL cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.sweep_expired().await;
            if removed > 0 {
                info!(removed, "TTL cleanup removed expired entries");
            } else {
                debug!("TTL cleanup found no expired entries");
            }
        }
    })
}
