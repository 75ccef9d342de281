//! FileSink - appends batches as JSON lines, one file per channel

use chrono::{SecondsFormat, Utc};
use contracts::{ContractError, DataSink, PublishedBatch, SensorEventBatch};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output directory
    pub base_path: PathBuf,
}

impl FileSinkConfig {
    /// `path` param, defaulting to `./output`
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        Self { base_path }
    }
}

/// One line of output
#[derive(Serialize)]
struct FileRecord<'a> {
    received_at: String,
    #[serde(flatten)]
    batch: &'a SensorEventBatch,
}

/// Debugging sink writing `<channel>_<start time>.jsonl` files.
///
/// Not a storage engine: no rotation, no compaction.
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    /// Start-of-run stamp shared by every file this sink creates
    run_stamp: String,
    writers: HashMap<String, BufWriter<File>>,
}

impl FileSink {
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            config,
            run_stamp: Utc::now().format("%Y%m%dT%H%M%S").to_string(),
            writers: HashMap::new(),
        })
    }

    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params))
    }

    /// Path of the file for `channel`
    pub fn file_path(&self, channel: &str) -> PathBuf {
        self.config
            .base_path
            .join(format!("{}_{}.jsonl", channel, self.run_stamp))
    }

    fn writer(&mut self, channel: &str) -> std::io::Result<&mut BufWriter<File>> {
        if !self.writers.contains_key(channel) {
            let path = self.file_path(channel);
            let file = open_append(&path)?;
            debug!(sink = %self.name, path = %path.display(), "output file opened");
            self.writers
                .insert(channel.to_string(), BufWriter::new(file));
        }
        self.writers
            .get_mut(channel)
            .ok_or_else(|| std::io::Error::other("writer missing after insert"))
    }

    fn append(&mut self, batch: &PublishedBatch) -> std::io::Result<()> {
        let record = FileRecord {
            received_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            batch: &batch.batch,
        };
        let writer = self.writer(&batch.channel)?;
        serde_json::to_writer(&mut *writer, &record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writer.write_all(b"\n")
    }

    fn flush_all(&mut self) -> Result<(), ContractError> {
        for writer in self.writers.values_mut() {
            writer
                .flush()
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        }
        Ok(())
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    fs::OpenOptions::new().create(true).append(true).open(path)
}

impl DataSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, batch),
        fields(sink = %self.name, seq = batch.batch.seq)
    )]
    async fn write(&mut self, batch: &PublishedBatch) -> Result<(), ContractError> {
        self.append(batch).map_err(|e| {
            error!(sink = %self.name, seq = batch.batch.seq, error = %e, "write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.flush_all()
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush_all()?;
        self.writers.clear();
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}
