//! LogSink - logs a one-line summary of every batch

use std::collections::BTreeMap;

use contracts::{ContractError, DataSink, PublishedBatch};
use tracing::{info, instrument};

/// Debugging sink: batch summaries via tracing
pub struct LogSink {
    name: String,
    batches: u64,
    events: u64,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batches: 0,
            events: 0,
        }
    }

    fn summarize(batch: &PublishedBatch) -> String {
        let mut kinds: BTreeMap<&'static str, usize> = BTreeMap::new();
        for event in &batch.batch.events {
            *kinds.entry(event.payload.kind().as_str()).or_insert(0) += 1;
        }
        kinds
            .iter()
            .map(|(kind, count)| format!("{kind}={count}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, batch),
        fields(sink = %self.name, seq = batch.batch.seq)
    )]
    async fn write(&mut self, batch: &PublishedBatch) -> Result<(), ContractError> {
        self.batches += 1;
        self.events += batch.batch.len() as u64;

        info!(
            channel = %batch.channel,
            seq = batch.batch.seq,
            events = batch.batch.len(),
            kinds = %Self::summarize(batch),
            "batch received"
        );
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            batches = self.batches,
            events = self.events,
            "LogSink closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        CanonicalSensorEvent, EventSource, SensorEventBatch, SensorPayload, SensorVector, Topic,
    };

    fn event(payload: SensorPayload) -> CanonicalSensorEvent {
        CanonicalSensorEvent {
            source: EventSource::Android,
            version: 104,
            sensor: 1,
            sensor_type: payload.kind().type_tag(),
            timestamp: 5,
            payload,
        }
    }

    #[tokio::test]
    async fn test_log_sink_counts() {
        let mut sink = LogSink::new("console");
        let batch = PublishedBatch {
            channel: Topic::new("sensorEvents"),
            batch: SensorEventBatch {
                seq: 3,
                events: vec![
                    event(SensorPayload::Gyro(SensorVector::default())),
                    event(SensorPayload::Light(12.0)),
                    event(SensorPayload::Light(13.0)),
                ],
            },
        };

        assert_eq!(LogSink::summarize(&batch), "gyroscope=1,light=2");
        sink.write(&batch).await.unwrap();
        sink.close().await.unwrap();
        assert_eq!(sink.batches, 1);
        assert_eq!(sink.events, 3);
        assert_eq!(sink.name(), "console");
    }
}
