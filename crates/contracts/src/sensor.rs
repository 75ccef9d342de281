//! CanonicalSensorEvent - published schema
//!
//! Normalized event consumed by downstream subscribers. The schema version is
//! the one carried by the raw event; this crate does not version it on its own.

use serde::{Deserialize, Serialize};

use crate::SensorKind;

/// Origin of a canonical event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// Vendor sensor hardware module
    #[default]
    Android,
}

/// Canonical sensor event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSensorEvent {
    /// Event origin (fixed)
    pub source: EventSource,

    /// Schema version copied from the raw event
    pub version: i32,

    /// Sensor handle
    pub sensor: i32,

    /// Vendor type tag
    #[serde(rename = "type")]
    pub sensor_type: i32,

    /// Driver timestamp (nanoseconds)
    pub timestamp: i64,

    /// Typed reading
    pub payload: SensorPayload,
}

/// Typed reading, one variant per recognized sensor kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorPayload {
    /// Accelerometer (m/s²)
    Acceleration(SensorVector),

    /// Calibrated magnetic field (µT)
    Magnetic(SensorVector),

    /// Uncalibrated magnetic field + hard-iron bias (µT)
    MagneticUncalibrated(UncalibratedVector),

    /// Calibrated angular rate (rad/s)
    Gyro(SensorVector),

    /// Uncalibrated angular rate + drift estimate (rad/s)
    GyroUncalibrated(UncalibratedVector),

    /// Distance (cm)
    Proximity(f32),

    /// Illuminance (lux)
    Light(f32),
}

impl SensorPayload {
    /// Sensor kind this payload belongs to
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorPayload::Acceleration(_) => SensorKind::Accelerometer,
            SensorPayload::Magnetic(_) => SensorKind::MagneticField,
            SensorPayload::MagneticUncalibrated(_) => SensorKind::MagneticFieldUncalibrated,
            SensorPayload::Gyro(_) => SensorKind::Gyroscope,
            SensorPayload::GyroUncalibrated(_) => SensorKind::GyroscopeUncalibrated,
            SensorPayload::Proximity(_) => SensorKind::Proximity,
            SensorPayload::Light(_) => SensorKind::Light,
        }
    }
}

/// 3-axis reading with accuracy status
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorVector {
    pub v: [f32; 3],
    pub status: i8,
}

/// Uncalibrated reading: raw x/y/z followed by bias x/y/z
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UncalibratedVector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub bias_x: f32,
    pub bias_y: f32,
    pub bias_z: f32,
}

impl UncalibratedVector {
    /// Flat `[x, y, z, bias_x, bias_y, bias_z]` layout
    pub fn to_array(&self) -> [f32; 6] {
        [
            self.x,
            self.y,
            self.z,
            self.bias_x,
            self.bias_y,
            self.bias_z,
        ]
    }
}

/// One published unit: the recognized events of a single poll, in poll order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorEventBatch {
    /// Process-local sequence number (monotonically increasing)
    pub seq: u64,

    /// Canonical events
    pub events: Vec<CanonicalSensorEvent>,
}

impl SensorEventBatch {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncalibrated_flat_layout() {
        let v = UncalibratedVector {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            bias_x: 4.0,
            bias_y: 5.0,
            bias_z: 6.0,
        };
        assert_eq!(v.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_payload_kind() {
        assert_eq!(SensorPayload::Light(1.0).kind(), SensorKind::Light);
        assert_eq!(
            SensorPayload::GyroUncalibrated(UncalibratedVector::default()).kind(),
            SensorKind::GyroscopeUncalibrated
        );
    }

    #[test]
    fn test_event_serde_shape() {
        let event = CanonicalSensorEvent {
            source: EventSource::Android,
            version: 104,
            sensor: 15,
            sensor_type: 1,
            timestamp: 1_000,
            payload: SensorPayload::Acceleration(SensorVector {
                v: [1.0, 2.0, 3.0],
                status: 3,
            }),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["source"], "android");
        assert_eq!(json["type"], 1);
        assert_eq!(json["payload"]["acceleration"]["status"], 3);
    }
}
