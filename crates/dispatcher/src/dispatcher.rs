//! Dispatcher - fans published batches out to sinks

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use contracts::{PublishedBatch, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, LogSink, NetworkSink};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub sinks: Vec<SinkConfig>,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    input_rx: mpsc::Receiver<PublishedBatch>,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig, input_rx: mpsc::Receiver<PublishedBatch>) -> Self {
        Self { config, input_rx }
    }

    /// Create every sink and start its worker
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub async fn build(self) -> Result<Dispatcher, DispatcherError> {
        let mut handles = Vec::with_capacity(self.config.sinks.len());
        for sink_config in &self.config.sinks {
            handles.push(create_sink_handle(sink_config).await?);
        }

        Ok(Dispatcher {
            handles,
            input_rx: self.input_rx,
        })
    }
}

#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
async fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::Network => {
            let sink = NetworkSink::from_params(&config.name, &config.params)
                .await
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}

/// Consumes the publish channel and forwards every batch to every sink
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<PublishedBatch>,
}

impl Dispatcher {
    /// Dispatcher over pre-built handles
    pub fn with_handles(
        handles: Vec<SinkHandle>,
        input_rx: mpsc::Receiver<PublishedBatch>,
    ) -> Self {
        Self { handles, input_rx }
    }

    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Run until every publisher is dropped, then drain and close the sinks.
    ///
    /// Returns the final per-sink counters.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> Vec<(String, MetricsSnapshot)> {
        info!(sinks = self.handles.len(), "dispatcher started");

        let mut batch_count: u64 = 0;
        while let Some(batch) = self.input_rx.recv().await {
            batch_count += 1;
            let batch = Arc::new(batch);
            for handle in &self.handles {
                handle.try_send(Arc::clone(&batch));
            }

            if batch_count.is_multiple_of(1000) {
                debug!(batches = batch_count, "dispatcher progress");
            }
        }

        info!(batches = batch_count, "publish channel closed, shutting down");

        let mut totals = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            let metrics = Arc::clone(handle.metrics());
            let name = handle.name().to_string();
            handle.shutdown().await;
            totals.push((name, metrics.snapshot()));
        }

        info!("dispatcher shutdown complete");
        totals
    }

    pub fn spawn(self) -> JoinHandle<Vec<(String, MetricsSnapshot)>> {
        tokio::spawn(self.run())
    }
}

/// Build a dispatcher from sink configs
#[instrument(name = "dispatcher_create", skip(sink_configs, input_rx))]
pub async fn create_dispatcher(
    sink_configs: Vec<SinkConfig>,
    input_rx: mpsc::Receiver<PublishedBatch>,
) -> Result<Dispatcher, DispatcherError> {
    let config = DispatcherConfig {
        sinks: sink_configs,
    };
    DispatcherBuilder::new(config, input_rx).build().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::ChannelPublisher;
    use contracts::{EventPublisher, SensorEventBatch, Topic};
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_fanout_to_every_sink() {
        let (publisher, input_rx) = ChannelPublisher::channel(10);
        let handles = vec![
            SinkHandle::spawn(LogSink::new("sink1"), 10),
            SinkHandle::spawn(LogSink::new("sink2"), 10),
        ];
        let task = Dispatcher::with_handles(handles, input_rx).spawn();

        let channel = Topic::new("sensorEvents");
        for seq in 0..5 {
            publisher.publish(&channel, SensorEventBatch { seq, events: Vec::new() });
        }
        drop(publisher);

        let totals = task.await.unwrap();
        assert_eq!(totals.len(), 2);
        for (_, snapshot) in totals {
            assert_eq!(snapshot.write_count, 5);
            assert_eq!(snapshot.dropped_count, 0);
        }
    }

    #[tokio::test]
    async fn test_create_dispatcher_from_config() {
        let (publisher, input_rx) = ChannelPublisher::channel(10);

        let configs = vec![SinkConfig {
            name: "console".to_string(),
            sink_type: SinkType::Log,
            queue_capacity: 50,
            params: HashMap::new(),
        }];

        let dispatcher = create_dispatcher(configs, input_rx).await.unwrap();
        assert_eq!(dispatcher.metrics()[0].0, "console");
        let task = dispatcher.spawn();

        publisher.publish(&Topic::new("sensorEvents"), SensorEventBatch::default());
        drop(publisher);

        let totals = task.await.unwrap();
        assert_eq!(totals[0].1.write_count, 1);
    }

    #[tokio::test]
    async fn test_bad_network_params_rejected() {
        let (_publisher, input_rx) = ChannelPublisher::channel(1);
        let configs = vec![SinkConfig {
            name: "udp".to_string(),
            sink_type: SinkType::Network,
            queue_capacity: 10,
            params: HashMap::new(),
        }];

        let err = create_dispatcher(configs, input_rx).await.err().unwrap();
        assert!(matches!(err, DispatcherError::SinkCreation { .. }));
    }
}
