//! Acquisition counters
//!
//! `AcquisitionMetrics` is shared (atomics) so other threads can poll a live
//! snapshot; `AcquisitionStats` fans every loop event out to the shared
//! counters, the Prometheus recorders and the run aggregator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{DriverError, PowerMode, SensorEventBatch};
use observability::{MetricsSummary, SensorMetricsAggregator};

/// Live acquisition counters
#[derive(Debug, Default)]
pub struct AcquisitionMetrics {
    pub batches_published: AtomicU64,
    pub events_published: AtomicU64,
    pub events_unrecognized: AtomicU64,
    pub poll_errors: AtomicU64,
    pub power_transitions: AtomicU64,
    pub sessions_opened: AtomicU64,
    pub reinits: AtomicU64,
}

impl AcquisitionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_published: self.batches_published.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            events_unrecognized: self.events_unrecognized.load(Ordering::Relaxed),
            poll_errors: self.poll_errors.load(Ordering::Relaxed),
            power_transitions: self.power_transitions.load(Ordering::Relaxed),
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            reinits: self.reinits.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches_published: u64,
    pub events_published: u64,
    pub events_unrecognized: u64,
    pub poll_errors: u64,
    pub power_transitions: u64,
    pub sessions_opened: u64,
    pub reinits: u64,
}

/// Loop-owned metrics fan-out
#[derive(Debug, Default)]
pub struct AcquisitionStats {
    shared: Arc<AcquisitionMetrics>,
    aggregator: SensorMetricsAggregator,
}

impl AcquisitionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared live counters
    pub fn shared(&self) -> Arc<AcquisitionMetrics> {
        Arc::clone(&self.shared)
    }

    pub fn summary(&self) -> MetricsSummary {
        self.aggregator.summary()
    }

    pub fn on_batch(&mut self, batch: &SensorEventBatch, unrecognized: usize) {
        self.shared.batches_published.fetch_add(1, Ordering::Relaxed);
        self.shared
            .events_published
            .fetch_add(batch.len() as u64, Ordering::Relaxed);
        self.shared
            .events_unrecognized
            .fetch_add(unrecognized as u64, Ordering::Relaxed);

        observability::record_batch_published(batch);
        observability::record_events_unrecognized(unrecognized);
        self.aggregator.update(batch, unrecognized);
    }

    pub fn on_poll_error(&mut self, error: &DriverError) {
        self.shared.poll_errors.fetch_add(1, Ordering::Relaxed);
        let code = match error {
            DriverError::Poll { code } => *code,
            _ => -1,
        };
        observability::record_poll_error(code);
        self.aggregator.record_poll_error();
    }

    pub fn on_power_transition(&mut self, mode: PowerMode) {
        self.shared.power_transitions.fetch_add(1, Ordering::Relaxed);
        observability::record_power_transition(mode);
        self.aggregator.record_power_transition();
    }

    /// A session opened after `failed_attempts` failures
    pub fn on_session_opened(&mut self, failed_attempts: u32) {
        self.shared.sessions_opened.fetch_add(1, Ordering::Relaxed);
        observability::record_session_opened();
        observability::record_session_open_failures(failed_attempts);
        observability::record_power_mode(PowerMode::Normal);
        self.aggregator.record_session();
    }

    pub fn on_session_failed(&mut self, attempts: u32) {
        observability::record_session_open_failures(attempts);
    }

    pub fn on_reinit(&mut self) {
        self.shared.reinits.fetch_add(1, Ordering::Relaxed);
        observability::record_reinit();
    }
}
