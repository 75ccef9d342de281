//! Channel publisher - bridges the blocking acquisition thread to the
//! async dispatcher

use std::sync::Arc;

use contracts::{EventPublisher, PublishedBatch, SensorEventBatch, Topic};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::metrics::PublisherMetrics;

/// Log every n-th drop at warn level
const DROP_WARN_EVERY: u64 = 100;

/// Non-blocking publisher over a bounded tokio channel.
///
/// Batches are dropped (and counted) when the dispatcher falls behind; the
/// acquisition loop is never stalled by a slow consumer.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::Sender<PublishedBatch>,
    metrics: Arc<PublisherMetrics>,
}

impl ChannelPublisher {
    /// Publisher plus the receiving end for the dispatcher
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<PublishedBatch>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                metrics: Arc::new(PublisherMetrics::default()),
            },
            rx,
        )
    }

    pub fn metrics(&self) -> Arc<PublisherMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl EventPublisher for ChannelPublisher {
    fn publish(&self, channel: &Topic, batch: SensorEventBatch) {
        let seq = batch.seq;
        let message = PublishedBatch {
            channel: channel.clone(),
            batch,
        };

        match self.tx.try_send(message) {
            Ok(()) => {
                self.metrics.inc_accepted();
                trace!(channel = %channel, seq, "batch published");
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.metrics.inc_dropped_full();
                if dropped == 1 || dropped.is_multiple_of(DROP_WARN_EVERY) {
                    warn!(channel = %channel, seq, dropped, "publish queue full, batch dropped");
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                let dropped = self.metrics.inc_dropped_closed();
                if dropped == 1 {
                    warn!(channel = %channel, seq, "dispatcher gone, batches discarded");
                }
            }
        }
    }
}
