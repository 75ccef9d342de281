//! Daemon orchestrator - wires the blocking acquisition thread to the async
//! side (dispatcher, device-state listener, signal handling).

use std::time::{Duration, Instant};

use contracts::SensordBlueprint;
use dispatcher::{create_dispatcher, device_state_channel, ChannelPublisher, StateListener};
use driver_session::BuiltinModuleLoader;
use ingestion::{LoopControl, SensorDaemon};
use tracing::{info, warn};

use super::{signals, RunExit, RunStats};
use crate::error::{CliError, Result};

/// Grace period for sinks to drain after the daemon stops
const DISPATCHER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub blueprint: SensordBlueprint,

    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Enumerate sensors on the first session and exit
    pub test_mode: bool,
}

/// Runs the daemon to completion
pub struct Orchestrator {
    config: OrchestratorConfig,
    control: LoopControl,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            config,
            control: LoopControl::new(),
        }
    }

    /// Flags the daemon observes; raising them has the same effect as the
    /// corresponding process signal
    pub fn control(&self) -> &LoopControl {
        &self.control
    }

    pub async fn run(self) -> Result<RunStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::install_metrics_exporter(port)?;
        }

        // Publish path
        let (publisher, publish_rx) = ChannelPublisher::channel(blueprint.publish.queue_capacity);
        let publisher_metrics = publisher.metrics();

        if blueprint.sinks.is_empty() {
            warn!("no sinks configured, published batches will be discarded");
        }
        let dispatcher_task = create_dispatcher(blueprint.sinks.clone(), publish_rx)
            .await?
            .spawn();
        info!(sinks = blueprint.sinks.len(), "dispatcher started");

        // Device state input; the feed stays alive for the whole run even
        // without a listener
        let (state_feed, state_cache) = device_state_channel();
        let listener_task = match &blueprint.state.listen_addr {
            Some(addr) => Some(StateListener::bind(addr, state_feed.clone()).await?.spawn()),
            None => {
                info!("no device state listener configured, device treated as inactive");
                None
            }
        };

        let signal_task = signals::install(&self.control)?;

        let loader = BuiltinModuleLoader::from_config(&blueprint.driver);
        let mut daemon = SensorDaemon::new(
            blueprint,
            Box::new(loader),
            publisher,
            state_cache,
        )?
        .with_test_mode(self.config.test_mode);

        // The driver API blocks; the daemon owns its own thread. Dropping the
        // daemon at the end of the closure closes the publish channel.
        let control = self.control.clone();
        let acquisition = tokio::task::spawn_blocking(move || {
            let exit = daemon.run(&control);
            (exit, daemon.summary())
        });
        let joined = acquisition.await;

        signal_task.abort();
        if let Some(task) = listener_task {
            task.abort();
        }

        let (exit, summary) =
            joined.map_err(|e| CliError::task("acquisition", e.to_string()))?;

        let sinks = match tokio::time::timeout(DISPATCHER_DRAIN_TIMEOUT, dispatcher_task).await {
            Ok(Ok(totals)) => totals,
            Ok(Err(e)) => {
                warn!(error = %e, "dispatcher task failed");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    timeout_secs = DISPATCHER_DRAIN_TIMEOUT.as_secs(),
                    "dispatcher did not drain in time"
                );
                Vec::new()
            }
        };
        drop(state_feed);

        let exit = RunExit::from(exit?);
        let stats = RunStats {
            exit,
            duration: start_time.elapsed(),
            summary,
            sinks,
            publish_accepted: publisher_metrics.accepted(),
            publish_dropped: publisher_metrics.dropped_full() + publisher_metrics.dropped_closed(),
        };

        info!(
            exit = ?stats.exit,
            duration_secs = stats.duration.as_secs_f64(),
            batches = stats.summary.total_batches,
            "daemon stopped"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SinkConfig, SinkType};
    use std::collections::HashMap;

    fn config(test_mode: bool) -> OrchestratorConfig {
        OrchestratorConfig {
            blueprint: SensordBlueprint::default(),
            metrics_port: None,
            test_mode,
        }
    }

    #[tokio::test]
    async fn test_test_mode_reports_enumerated_sensors() {
        let stats = Orchestrator::new(config(true)).run().await.unwrap();

        assert_eq!(
            stats.exit,
            RunExit::TestMode(driver_session::SimulatedModule::sensor_list().len())
        );
        assert_eq!(stats.summary.total_batches, 0);
    }

    #[tokio::test]
    async fn test_shutdown_drains_into_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(false);
        config.blueprint.sinks = vec![SinkConfig {
            name: "file".to_string(),
            sink_type: SinkType::File,
            queue_capacity: 64,
            params: HashMap::from([(
                "path".to_string(),
                dir.path().display().to_string(),
            )]),
        }];

        let orchestrator = Orchestrator::new(config);
        let control = orchestrator.control().clone();
        let run = tokio::spawn(orchestrator.run());

        tokio::time::sleep(Duration::from_millis(300)).await;
        control.shutdown.request();

        let stats = run.await.unwrap().unwrap();
        assert_eq!(stats.exit, RunExit::Shutdown);
        assert_eq!(stats.sinks.len(), 1);
        assert!(stats.publish_accepted > 0);
        let sink = &stats.sinks[0].1;
        assert_eq!(sink.write_count + sink.dropped_count, stats.publish_accepted);

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }
}
