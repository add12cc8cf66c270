//! Telemetry Sink Module
//!
//! Destination for flushed telemetry batches. The shipped default writes
//! batches through tracing; a capturing sink backs the tests. External
//! metrics backends plug in by implementing the trait.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::Result;
use crate::telemetry::TelemetryRecord;

// == Telemetry Sink Trait ==
/// Receives flushed batches. A failed write leaves the batch with the
/// caller, which re-buffers it.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn write_batch(&self, batch: &[TelemetryRecord]) -> Result<()>;
}

// == Log Sink ==
/// Default sink: emits each batch through the process log stream.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TelemetrySink for LogSink {
    async fn write_batch(&self, batch: &[TelemetryRecord]) -> Result<()> {
        info!(records = batch.len(), "telemetry batch flushed");
        Ok(())
    }
}

// == Memory Sink ==
/// Test sink that captures every flushed batch.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Mutex<Vec<Vec<TelemetryRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All batches received so far, in flush order.
    pub async fn batches(&self) -> Vec<Vec<TelemetryRecord>> {
        self.batches.lock().await.clone()
    }

    /// Total records received across all batches.
    pub async fn record_count(&self) -> usize {
        self.batches.lock().await.iter().map(Vec::len).sum()
    }
}

#[async_trait]
impl TelemetrySink for MemorySink {
    async fn write_batch(&self, batch: &[TelemetryRecord]) -> Result<()> {
        self.batches.lock().await.push(batch.to_vec());
        Ok(())
    }
}
