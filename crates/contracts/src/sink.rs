//! Publishing contracts
//!
//! `EventPublisher` is the synchronous hand-off used by the acquisition loop;
//! `DataSink` is the async consumer interface behind the dispatcher.

use crate::{ContractError, SensorEventBatch, Topic};

/// A batch tagged with the channel it was published on
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PublishedBatch {
    pub channel: Topic,
    pub batch: SensorEventBatch,
}

/// Fire-and-forget publisher invoked from the acquisition thread.
///
/// Must not block for long; delivery is best-effort and failures are the
/// publisher's own concern.
pub trait EventPublisher: Send {
    fn publish(&self, channel: &Topic, batch: SensorEventBatch);
}

/// Data output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(DataSink: Send)]
pub trait LocalDataSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one published batch
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, batch: &PublishedBatch) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
