//! SinkHandle - one sink behind its own bounded queue and worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{DataSink, PublishedBatch};

use crate::metrics::SinkMetrics;

/// Handle to a running sink worker
pub struct SinkHandle {
    name: String,
    tx: mpsc::Sender<Arc<PublishedBatch>>,
    metrics: Arc<SinkMetrics>,
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Spawn the worker task for `sink`
    pub fn spawn<S: DataSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue a batch without waiting.
    ///
    /// Returns false if the batch was dropped (queue full or worker gone).
    pub fn try_send(&self, batch: Arc<PublishedBatch>) -> bool {
        match self.tx.try_send(batch) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(b)) => {
                self.metrics.inc_dropped_count();
                observability::record_batch_dispatched(&self.name, false);
                warn!(
                    sink = %self.name,
                    seq = b.batch.seq,
                    "queue full, batch dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(sink = %self.name, "sink worker closed unexpectedly");
                false
            }
        }
    }

    /// Drain the queue and stop the worker
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "worker task panicked");
        }
        debug!(sink = %self.name, "sink handle shut down");
    }
}

#[instrument(name = "sink_worker_loop", skip(sink, rx, metrics), fields(sink = %name))]
async fn sink_worker<S: DataSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<Arc<PublishedBatch>>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!("sink worker started");

    while let Some(batch) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match sink.write(&batch).await {
            Ok(()) => {
                metrics.inc_write_count();
                observability::record_batch_dispatched(&name, true);
            }
            Err(e) => {
                // a failed write never stops the worker
                metrics.inc_failure_count();
                observability::record_batch_dispatched(&name, false);
                error!(seq = batch.batch.seq, error = %e, "write failed");
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(error = %e, "flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(error = %e, "close failed on shutdown");
    }

    debug!("sink worker stopped");
}
