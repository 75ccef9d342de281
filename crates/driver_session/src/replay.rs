//! Replay module - plays back a recorded sensor session
//!
//! Recording format (JSONL):
//! - line 1: header `{"id": "sensors", "name": "...", "sensors": [SensorInfo...]}`
//! - following lines: one `RawSensorEvent` per line
//!
//! Events are paced by their recorded timestamps (scaled by the speed
//! multiplier) and only delivered for sensors that are currently active.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use contracts::{
    DriverError, ModuleLoadError, RawSensorEvent, ReplayConfig, SensorDevice, SensorHandle,
    SensorInfo, SensorModule,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// First line of a recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayHeader {
    /// Module id the recording was taken from
    pub id: String,

    /// Module display name
    pub name: String,

    /// Enumerated sensors at recording time
    #[serde(default)]
    pub sensors: Vec<SensorInfo>,
}

/// Module backed by a recording file
#[derive(Debug)]
pub struct ReplayModule {
    header: ReplayHeader,
    path: PathBuf,
    speed: f64,
    loop_playback: bool,
    poll_timeout: Duration,
}

impl ReplayModule {
    /// Bind a recording. Reads only the header.
    pub fn load(config: &ReplayConfig, poll_timeout: Duration) -> Result<Self, ModuleLoadError> {
        let path = PathBuf::from(&config.path);
        let header = read_header(&path)?;

        info!(
            path = %path.display(),
            module = %header.name,
            sensors = header.sensors.len(),
            "replay module bound"
        );

        Ok(Self {
            header,
            path,
            speed: config.speed,
            loop_playback: config.loop_playback,
            poll_timeout,
        })
    }
}

fn read_header(path: &Path) -> Result<ReplayHeader, ModuleLoadError> {
    let instance = path.display().to_string();
    let file = File::open(path).map_err(|e| ModuleLoadError::not_found(&instance, e.to_string()))?;

    let mut first = String::new();
    BufReader::new(file)
        .read_line(&mut first)
        .map_err(|e| ModuleLoadError::not_found(&instance, e.to_string()))?;

    serde_json::from_str(first.trim()).map_err(|_| ModuleLoadError::SymbolMissing {
        instance,
        symbol: "header".to_string(),
    })
}

impl SensorModule for ReplayModule {
    fn id(&self) -> &str {
        &self.header.id
    }

    fn name(&self) -> &str {
        &self.header.name
    }

    fn open(&self) -> Result<Box<dyn SensorDevice>, DriverError> {
        let records = read_records(&self.path)?;
        debug!(records = records.len(), "replay device opened");

        Ok(Box::new(ReplayDevice {
            sensors: self.header.sensors.clone(),
            records,
            cursor: 0,
            active: HashSet::new(),
            anchor: None,
            speed: self.speed,
            loop_playback: self.loop_playback,
            poll_timeout: self.poll_timeout,
        }))
    }
}

fn read_records(path: &Path) -> Result<Vec<RawSensorEvent>, DriverError> {
    let file = File::open(path).map_err(|e| DriverError::open(e.to_string()))?;
    let mut records = Vec::new();

    for (line_no, line) in BufReader::new(file).lines().enumerate().skip(1) {
        let line = line.map_err(|e| DriverError::open(e.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RawSensorEvent>(&line) {
            Ok(event) => records.push(event),
            Err(e) => warn!(line = line_no + 1, error = %e, "skipping malformed replay record"),
        }
    }

    records.sort_by_key(|e| e.timestamp);
    Ok(records)
}

/// Open replay device
struct ReplayDevice {
    sensors: Vec<SensorInfo>,
    records: Vec<RawSensorEvent>,
    cursor: usize,
    active: HashSet<SensorHandle>,
    /// (wall clock, recorded timestamp) of the first delivered record
    anchor: Option<(Instant, i64)>,
    speed: f64,
    loop_playback: bool,
    poll_timeout: Duration,
}

impl ReplayDevice {
    /// Wall-clock offset at which record `ts` is due
    fn due_offset(&self, base_ts: i64, ts: i64) -> Duration {
        let nanos = (ts.saturating_sub(base_ts)).max(0) as f64 / self.speed;
        Duration::from_nanos(nanos as u64)
    }

    fn rewind_if_done(&mut self) -> bool {
        if self.cursor < self.records.len() {
            return true;
        }
        if self.loop_playback && !self.records.is_empty() {
            self.cursor = 0;
            self.anchor = None;
            debug!("replay restarted");
            return true;
        }
        false
    }
}

impl SensorDevice for ReplayDevice {
    fn sensor_list(&self) -> Vec<SensorInfo> {
        self.sensors.clone()
    }

    fn activate(&mut self, handle: SensorHandle, enabled: bool) -> Result<(), DriverError> {
        if enabled {
            self.active.insert(handle);
        } else {
            self.active.remove(&handle);
        }
        Ok(())
    }

    fn set_delay(&mut self, _handle: SensorHandle, _delay_ns: i64) -> Result<(), DriverError> {
        // Recorded cadence is fixed
        Ok(())
    }

    fn poll(&mut self, buffer: &mut [RawSensorEvent]) -> Result<usize, DriverError> {
        if buffer.is_empty() {
            return Ok(0);
        }
        if !self.rewind_if_done() {
            thread::sleep(self.poll_timeout);
            return Ok(0);
        }

        let (start, base_ts) = *self
            .anchor
            .get_or_insert((Instant::now(), self.records[self.cursor].timestamp));

        let next_due = self.due_offset(base_ts, self.records[self.cursor].timestamp);
        let elapsed = start.elapsed();
        if next_due > elapsed {
            let wait = next_due - elapsed;
            if wait > self.poll_timeout {
                thread::sleep(self.poll_timeout);
                return Ok(0);
            }
            thread::sleep(wait);
        }

        let elapsed = start.elapsed();
        let mut count = 0;
        while count < buffer.len() && self.cursor < self.records.len() {
            let record = self.records[self.cursor];
            if self.due_offset(base_ts, record.timestamp) > elapsed {
                break;
            }
            self.cursor += 1;
            if self.active.contains(&record.sensor) {
                buffer[count] = record;
                count += 1;
            }
        }

        Ok(count)
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.active.clear();
        Ok(())
    }
}
