//! SensordBlueprint - Config Loader output
//!
//! Describes the complete daemon configuration: driver selection, the sensor
//! registry, loop tuning, power management, session recovery and output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use validator::Validate;

use crate::{
    ContractError, SensorDescriptor, SensorHandle, SensorRegistry, SENSORS_HARDWARE_MODULE_ID,
};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SensordBlueprint {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Hardware module selection
    #[serde(default)]
    #[validate(nested)]
    pub driver: DriverConfig,

    /// Monitored sensors, in activation order
    #[serde(default = "reference_sensors")]
    #[validate(nested)]
    pub sensors: Vec<SensorConfig>,

    #[serde(default)]
    #[validate(nested)]
    pub acquisition: AcquisitionConfig,

    #[serde(default)]
    #[validate(nested)]
    pub power: PowerConfig,

    #[serde(default)]
    #[validate(nested)]
    pub session: SessionConfig,

    #[serde(default)]
    #[validate(nested)]
    pub publish: PublishConfig,

    #[serde(default)]
    pub state: StateConfig,

    /// Output routing
    #[serde(default = "default_sinks")]
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,
}

impl Default for SensordBlueprint {
    fn default() -> Self {
        Self {
            version: ConfigVersion::V1,
            driver: DriverConfig::default(),
            sensors: reference_sensors(),
            acquisition: AcquisitionConfig::default(),
            power: PowerConfig::default(),
            session: SessionConfig::default(),
            publish: PublishConfig::default(),
            state: StateConfig::default(),
            sinks: default_sinks(),
        }
    }
}

impl SensordBlueprint {
    /// Build the immutable registry from `[[sensors]]`
    pub fn to_registry(&self) -> Result<SensorRegistry, ContractError> {
        SensorRegistry::new(self.sensors.iter().map(SensorConfig::descriptor).collect())
    }
}

/// Driver / hardware module selection
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DriverConfig {
    /// Module class to load
    #[serde(default = "default_class_id")]
    #[validate(length(min = 1))]
    pub class_id: String,

    /// Instance hint (e.g. "simulated", "replay"); `None` selects the default module
    #[serde(default)]
    pub instance: Option<String>,

    /// Upper bound on a single blocking poll
    #[serde(default = "default_poll_timeout_ms")]
    #[validate(range(min = 1))]
    pub poll_timeout_ms: u64,

    /// Replay module options
    #[serde(default)]
    #[validate(nested)]
    pub replay: Option<ReplayConfig>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            class_id: default_class_id(),
            instance: None,
            poll_timeout_ms: default_poll_timeout_ms(),
            replay: None,
        }
    }
}

fn default_class_id() -> String {
    SENSORS_HARDWARE_MODULE_ID.to_string()
}

fn default_poll_timeout_ms() -> u64 {
    100
}

/// Recorded-session playback
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReplayConfig {
    /// JSONL recording path
    #[validate(length(min = 1))]
    pub path: String,

    /// Playback speed multiplier
    #[serde(default = "default_speed")]
    #[validate(range(exclusive_min = 0.0))]
    pub speed: f64,

    /// Restart from the beginning at end of file
    #[serde(default)]
    pub loop_playback: bool,
}

fn default_speed() -> f64 {
    1.0
}

/// One registry entry
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SensorConfig {
    /// Driver handle
    pub handle: SensorHandle,

    /// Label used in logs
    #[serde(default)]
    pub name: String,

    /// Requested sampling interval (ms)
    #[validate(range(min = 1))]
    pub interval_ms: u64,

    /// Kept active in low-power mode
    #[serde(default)]
    pub offroad: bool,
}

impl SensorConfig {
    fn new(handle: SensorHandle, name: &str, interval_ms: u64, offroad: bool) -> Self {
        Self {
            handle,
            name: name.to_string(),
            interval_ms,
            offroad,
        }
    }

    pub fn descriptor(&self) -> SensorDescriptor {
        SensorDescriptor {
            handle: self.handle,
            sampling_interval_ns: (self.interval_ms as i64).saturating_mul(1_000_000),
            offroad: self.offroad,
        }
    }
}

/// Reference registry for the stock hardware module, ascending by handle
pub fn reference_sensors() -> Vec<SensorConfig> {
    vec![
        SensorConfig::new(0, "proximity", 100, false),
        SensorConfig::new(3, "magnetometer_uncalibrated", 100, false),
        SensorConfig::new(8, "gyroscope_uncalibrated", 10, true),
        SensorConfig::new(9, "gyroscope", 10, false),
        SensorConfig::new(13, "magnetometer", 100, false),
        SensorConfig::new(14, "light", 100, true),
        SensorConfig::new(15, "accelerometer", 10, true),
    ]
}

/// Acquisition loop tuning
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AcquisitionConfig {
    /// Events requested per poll
    #[serde(default = "default_batch_capacity")]
    #[validate(range(min = 1))]
    pub batch_capacity: usize,

    /// Consecutive poll failures tolerated before backing off
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    #[serde(default = "default_poll_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_poll_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl AcquisitionConfig {
    pub fn backoff(&self) -> BackoffConfig {
        BackoffConfig::new(self.initial_backoff_ms, self.max_backoff_ms)
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            batch_capacity: default_batch_capacity(),
            failure_threshold: default_failure_threshold(),
            initial_backoff_ms: default_poll_initial_backoff_ms(),
            max_backoff_ms: default_poll_max_backoff_ms(),
        }
    }
}

fn default_batch_capacity() -> usize {
    16
}

fn default_failure_threshold() -> u32 {
    8
}

fn default_poll_initial_backoff_ms() -> u64 {
    1
}

fn default_poll_max_backoff_ms() -> u64 {
    100
}

/// Power management
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PowerConfig {
    /// Disable to keep the full registry active regardless of device state
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Check device state every N counted batches
    #[serde(default = "default_check_every")]
    #[validate(range(min = 1))]
    pub check_every: u64,

    /// Device state topic
    #[serde(default = "default_state_topic")]
    #[validate(length(min = 1))]
    pub state_topic: String,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_every: default_check_every(),
            state_topic: default_state_topic(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_check_every() -> u64 {
    20
}

fn default_state_topic() -> String {
    "deviceState".to_string()
}

/// Module-load / device-open retry policy
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionConfig {
    /// Attempts per (re)initialization; 0 retries forever
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_session_initial_backoff_ms")]
    #[validate(range(min = 1))]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_session_max_backoff_ms")]
    #[validate(range(min = 1))]
    pub max_backoff_ms: u64,
}

impl SessionConfig {
    pub fn backoff(&self) -> BackoffConfig {
        BackoffConfig::new(self.initial_backoff_ms, self.max_backoff_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_session_initial_backoff_ms(),
            max_backoff_ms: default_session_max_backoff_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    10
}

fn default_session_initial_backoff_ms() -> u64 {
    500
}

fn default_session_max_backoff_ms() -> u64 {
    10_000
}

/// Exponential backoff bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    pub initial: Duration,
    pub max: Duration,
}

impl BackoffConfig {
    pub fn new(initial_ms: u64, max_ms: u64) -> Self {
        Self {
            initial: Duration::from_millis(initial_ms),
            max: Duration::from_millis(max_ms.max(initial_ms)),
        }
    }

    /// Delay before retry number `attempt` (0-based): `initial * 2^attempt`, capped at `max`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
        self.initial.saturating_mul(factor).min(self.max)
    }
}

/// Canonical batch publishing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PublishConfig {
    /// Output channel name
    #[serde(default = "default_channel")]
    #[validate(length(min = 1))]
    pub channel: String,

    /// Batches buffered between the acquisition thread and the dispatcher
    #[serde(default = "default_publish_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            queue_capacity: default_publish_capacity(),
        }
    }
}

fn default_channel() -> String {
    "sensorEvents".to_string()
}

fn default_publish_capacity() -> usize {
    256
}

/// Device state input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateConfig {
    /// UDP address to receive device state messages on
    #[serde(default)]
    pub listen_addr: Option<String>,
}

/// Sink output config
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    #[validate(length(min = 1))]
    pub name: String,

    pub sink_type: SinkType,

    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

fn default_sinks() -> Vec<SinkConfig> {
    vec![SinkConfig {
        name: "log".to_string(),
        sink_type: SinkType::Log,
        queue_capacity: default_queue_capacity(),
        params: HashMap::new(),
    }]
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// JSON lines file output
    File,
    /// Network output (UDP)
    Network,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_matches_reference_hardware() {
        let blueprint = SensordBlueprint::default();
        let registry = blueprint.to_registry().unwrap();

        let handles: Vec<_> = registry.iter().map(|s| s.handle).collect();
        assert_eq!(handles, vec![0, 3, 8, 9, 13, 14, 15]);

        let offroad: Vec<_> = registry.offroad().map(|s| s.handle).collect();
        assert_eq!(offroad, vec![8, 14, 15]);

        assert_eq!(registry.get(9).unwrap().sampling_interval_ns, 10_000_000);
        assert_eq!(registry.get(0).unwrap().sampling_interval_ns, 100_000_000);
    }

    #[test]
    fn test_defaults() {
        let blueprint = SensordBlueprint::default();
        assert_eq!(blueprint.acquisition.batch_capacity, 16);
        assert_eq!(blueprint.power.check_every, 20);
        assert_eq!(blueprint.power.state_topic, "deviceState");
        assert_eq!(blueprint.publish.channel, "sensorEvents");
        assert_eq!(blueprint.driver.class_id, "sensors");
        assert!(blueprint.validate().is_ok());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let backoff = BackoffConfig::new(500, 4_000);
        assert_eq!(backoff.delay_for(0), Duration::from_millis(500));
        assert_eq!(backoff.delay_for(1), Duration::from_millis(1_000));
        assert_eq!(backoff.delay_for(3), Duration::from_millis(4_000));
        assert_eq!(backoff.delay_for(40), Duration::from_millis(4_000));
    }

    #[test]
    fn test_range_validation() {
        let mut blueprint = SensordBlueprint::default();
        blueprint.acquisition.batch_capacity = 0;
        assert!(blueprint.validate().is_err());
    }
}
