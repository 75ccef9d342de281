//! Sensor registry and power modes
//!
//! The registry is the fixed set of monitored sensors, built once at startup
//! and never mutated. Registry order is activation order.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Driver-assigned sensor handle
pub type SensorHandle = i32;

/// One monitored sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorDescriptor {
    /// Driver handle
    pub handle: SensorHandle,

    /// Requested sampling interval (nanoseconds)
    pub sampling_interval_ns: i64,

    /// Kept active in low-power mode
    pub offroad: bool,
}

/// Immutable, cheap-to-clone set of monitored sensors
#[derive(Debug, Clone)]
pub struct SensorRegistry {
    sensors: Arc<[SensorDescriptor]>,
}

impl SensorRegistry {
    /// Build a registry, rejecting duplicate handles
    pub fn new(sensors: Vec<SensorDescriptor>) -> Result<Self, ContractError> {
        let mut seen = HashSet::new();
        for sensor in &sensors {
            if !seen.insert(sensor.handle) {
                return Err(ContractError::config_validation(
                    format!("sensors[handle={}]", sensor.handle),
                    "duplicate sensor handle",
                ));
            }
        }

        Ok(Self {
            sensors: sensors.into(),
        })
    }

    /// Sensors in activation order
    pub fn iter(&self) -> impl Iterator<Item = &SensorDescriptor> {
        self.sensors.iter()
    }

    /// Sensors kept active in low-power mode
    pub fn offroad(&self) -> impl Iterator<Item = &SensorDescriptor> {
        self.sensors.iter().filter(|s| s.offroad)
    }

    pub fn get(&self, handle: SensorHandle) -> Option<&SensorDescriptor> {
        self.sensors.iter().find(|s| s.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

/// Activation set selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerMode {
    /// Full registry active
    #[default]
    Normal,
    /// Only offroad-eligible sensors active
    LowPower,
}

impl PowerMode {
    /// Desired mode for the current device activity
    pub fn for_device_started(started: bool) -> Self {
        if started {
            PowerMode::Normal
        } else {
            PowerMode::LowPower
        }
    }

    /// Whether `sensor` belongs to this mode's activation set
    pub fn includes(self, sensor: &SensorDescriptor) -> bool {
        match self {
            PowerMode::Normal => true,
            PowerMode::LowPower => sensor.offroad,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PowerMode::Normal => "normal",
            PowerMode::LowPower => "low_power",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(handle: SensorHandle, offroad: bool) -> SensorDescriptor {
        SensorDescriptor {
            handle,
            sampling_interval_ns: 10_000_000,
            offroad,
        }
    }

    #[test]
    fn test_duplicate_handles_rejected() {
        let result = SensorRegistry::new(vec![descriptor(1, false), descriptor(1, true)]);
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_registry_keeps_order() {
        let registry = SensorRegistry::new(vec![
            descriptor(9, false),
            descriptor(0, true),
            descriptor(3, false),
        ])
        .unwrap();
        let handles: Vec<_> = registry.iter().map(|s| s.handle).collect();
        assert_eq!(handles, vec![9, 0, 3]);

        let offroad: Vec<_> = registry.offroad().map(|s| s.handle).collect();
        assert_eq!(offroad, vec![0]);
    }

    #[test]
    fn test_power_mode_selection() {
        assert_eq!(PowerMode::for_device_started(true), PowerMode::Normal);
        assert_eq!(PowerMode::for_device_started(false), PowerMode::LowPower);

        let onroad_only = descriptor(9, false);
        assert!(PowerMode::Normal.includes(&onroad_only));
        assert!(!PowerMode::LowPower.includes(&onroad_only));
        assert!(PowerMode::LowPower.includes(&descriptor(14, true)));
    }
}
