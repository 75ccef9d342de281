//! Acquisition metrics
//!
//! Prometheus recorders for the acquisition loop and dispatcher, plus an
//! in-memory aggregator for the run summary printed at shutdown.

use std::collections::BTreeMap;

use contracts::{PowerMode, SensorEventBatch};
use metrics::{counter, gauge, histogram};

/// Record one published batch
pub fn record_batch_published(batch: &SensorEventBatch) {
    counter!("sensord_batches_published_total").increment(1);
    counter!("sensord_events_published_total").increment(batch.len() as u64);
    histogram!("sensord_batch_size").record(batch.len() as f64);

    for event in &batch.events {
        counter!(
            "sensord_sensor_events_total",
            "sensor_type" => event.payload.kind().as_str()
        )
        .increment(1);
    }
}

/// Record raw events dropped for an unrecognized type tag
pub fn record_events_unrecognized(count: usize) {
    if count > 0 {
        counter!("sensord_events_unrecognized_total").increment(count as u64);
    }
}

/// Record a failed poll
pub fn record_poll_error(code: i32) {
    counter!("sensord_poll_errors_total", "code" => code.to_string()).increment(1);
}

/// Record the currently applied power mode (1 = normal, 0 = low power)
pub fn record_power_mode(mode: PowerMode) {
    let value = match mode {
        PowerMode::Normal => 1.0,
        PowerMode::LowPower => 0.0,
    };
    gauge!("sensord_power_mode").set(value);
}

/// Record a power mode switch
pub fn record_power_transition(to: PowerMode) {
    counter!("sensord_power_transitions_total", "to" => to.as_str()).increment(1);
    record_power_mode(to);
}

/// Record a rejected activate/set_delay
pub fn record_activation_failure(handle: i32, operation: &'static str) {
    counter!(
        "sensord_activation_failures_total",
        "handle" => handle.to_string(),
        "operation" => operation
    )
    .increment(1);
}

/// Record a successfully opened driver session
pub fn record_session_opened() {
    counter!("sensord_sessions_opened_total").increment(1);
}

/// Record failed open attempts preceding a session (or giving up)
pub fn record_session_open_failures(count: u32) {
    if count > 0 {
        counter!("sensord_session_open_failures_total").increment(u64::from(count));
    }
}

/// Record a reinitialization request being served
pub fn record_reinit() {
    counter!("sensord_reinit_total").increment(1);
}

/// Record a batch handed to a sink
pub fn record_batch_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "sensord_batches_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// In-memory aggregation of one daemon run
#[derive(Debug, Clone, Default)]
pub struct SensorMetricsAggregator {
    pub total_batches: u64,
    pub total_events: u64,
    pub total_unrecognized: u64,
    pub poll_errors: u64,
    pub power_transitions: u64,
    pub sessions: u64,

    /// Events per batch
    pub batch_size_stats: RunningStats,

    /// Events per sensor kind
    pub kind_counts: BTreeMap<&'static str, u64>,
}

impl SensorMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one published batch and the raw events it dropped
    pub fn update(&mut self, batch: &SensorEventBatch, unrecognized: usize) {
        self.total_batches += 1;
        self.total_events += batch.len() as u64;
        self.total_unrecognized += unrecognized as u64;
        self.batch_size_stats.push(batch.len() as f64);

        for event in &batch.events {
            *self.kind_counts.entry(event.payload.kind().as_str()).or_insert(0) += 1;
        }
    }

    pub fn record_poll_error(&mut self) {
        self.poll_errors += 1;
    }

    pub fn record_power_transition(&mut self) {
        self.power_transitions += 1;
    }

    pub fn record_session(&mut self) {
        self.sessions += 1;
    }

    pub fn summary(&self) -> MetricsSummary {
        let received = self.total_events + self.total_unrecognized;
        MetricsSummary {
            total_batches: self.total_batches,
            total_events: self.total_events,
            total_unrecognized: self.total_unrecognized,
            unrecognized_rate: if received > 0 {
                self.total_unrecognized as f64 / received as f64 * 100.0
            } else {
                0.0
            },
            poll_errors: self.poll_errors,
            power_transitions: self.power_transitions,
            sessions: self.sessions,
            batch_size: StatsSummary::from(&self.batch_size_stats),
            kind_counts: self.kind_counts.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Run summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_batches: u64,
    pub total_events: u64,
    pub total_unrecognized: u64,
    pub unrecognized_rate: f64,
    pub poll_errors: u64,
    pub power_transitions: u64,
    pub sessions: u64,
    pub batch_size: StatsSummary,
    pub kind_counts: BTreeMap<&'static str, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Sensor Metrics Summary ===")?;
        writeln!(f, "Batches published: {}", self.total_batches)?;
        writeln!(f, "Events published: {}", self.total_events)?;
        writeln!(
            f,
            "Unrecognized events: {} ({:.2}%)",
            self.total_unrecognized, self.unrecognized_rate
        )?;
        writeln!(f, "Poll errors: {}", self.poll_errors)?;
        writeln!(f, "Power transitions: {}", self.power_transitions)?;
        writeln!(f, "Driver sessions: {}", self.sessions)?;
        writeln!(f, "Batch size: {}", self.batch_size)?;

        if !self.kind_counts.is_empty() {
            writeln!(f, "Events by sensor:")?;
            for (kind, count) in &self.kind_counts {
                writeln!(f, "  {}: {}", kind, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
