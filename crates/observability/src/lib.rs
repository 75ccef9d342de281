//! # Observability
//!
//! Logging setup, the optional Prometheus endpoint, and the acquisition
//! metric recorders shared by every sensord crate.
//!
//! ```ignore
//! observability::init_logging(&LoggingConfig::from_verbosity(LogFormat::Compact, false, 1))?;
//! observability::install_metrics_exporter(9100)?;
//!
//! observability::record_batch_published(batch.len());
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

pub use crate::metrics::{
    record_activation_failure, record_batch_dispatched, record_batch_published,
    record_events_unrecognized, record_poll_error, record_power_mode, record_power_transition,
    record_reinit, record_session_open_failures, record_session_opened, MetricsSummary,
    RunningStats, SensorMetricsAggregator, StatsSummary,
};

/// Log line layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, with thread and source location
    Json,
    /// Multi-line, for an interactive terminal
    Pretty,
    #[default]
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset
    pub default_directive: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            default_directive: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Map `-q` / `-v` counts onto a default level
    pub fn from_verbosity(format: LogFormat, quiet: bool, verbose: u8) -> Self {
        let level = match (quiet, verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        };
        Self {
            format,
            default_directive: level.to_string(),
        }
    }
}

/// Install the global tracing subscriber. Fails if one is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_directive))
        .with_context(|| format!("invalid log directive '{}'", config.default_directive))?;

    tracing_subscriber::registry()
        .with(fmt_layer(config.format))
        .with(filter)
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    tracing::debug!(format = ?config.format, "logging initialized");
    Ok(())
}

fn fmt_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    }
}

/// Serve the Prometheus scrape endpoint on `0.0.0.0:port` and make it the
/// global metrics recorder
pub fn install_metrics_exporter(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .with_context(|| format!("failed to install Prometheus exporter on port {port}"))?;

    tracing::info!(port, "metrics endpoint available");
    Ok(())
}
