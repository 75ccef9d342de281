//! RawSensorEvent - driver poll buffer layout
//!
//! Mirrors the vendor event record: a fixed header followed by a 16-float data
//! area whose meaning depends on the type tag. Accessors expose the typed views
//! of that area; they never reinterpret memory.

use serde::{Deserialize, Serialize};

/// Number of floats in the vendor data area.
pub const RAW_DATA_LEN: usize = 16;

/// Record version reported by the vendor ABI (size of the C record in bytes).
pub const RAW_EVENT_VERSION: i32 = 104;

/// Vendor type tags.
pub mod type_tag {
    pub const ACCELEROMETER: i32 = 1;
    pub const MAGNETIC_FIELD: i32 = 2;
    pub const GYROSCOPE: i32 = 4;
    pub const LIGHT: i32 = 5;
    pub const PROXIMITY: i32 = 8;
    pub const MAGNETIC_FIELD_UNCALIBRATED: i32 = 14;
    pub const GYROSCOPE_UNCALIBRATED: i32 = 16;
    pub const ADDITIONAL_INFO: i32 = 33;
    pub const ACCELEROMETER_UNCALIBRATED: i32 = 35;
}

/// Recognized sensor kinds.
///
/// Closed set: the translator matches on it exhaustively, so adding a kind is
/// a compile error everywhere a payload mapping is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Accelerometer,
    MagneticField,
    MagneticFieldUncalibrated,
    Gyroscope,
    GyroscopeUncalibrated,
    Proximity,
    Light,
}

impl SensorKind {
    pub const ALL: [SensorKind; 7] = [
        SensorKind::Accelerometer,
        SensorKind::MagneticField,
        SensorKind::MagneticFieldUncalibrated,
        SensorKind::Gyroscope,
        SensorKind::GyroscopeUncalibrated,
        SensorKind::Proximity,
        SensorKind::Light,
    ];

    /// Vendor type tag for this kind
    pub const fn type_tag(self) -> i32 {
        match self {
            SensorKind::Accelerometer => type_tag::ACCELEROMETER,
            SensorKind::MagneticField => type_tag::MAGNETIC_FIELD,
            SensorKind::MagneticFieldUncalibrated => type_tag::MAGNETIC_FIELD_UNCALIBRATED,
            SensorKind::Gyroscope => type_tag::GYROSCOPE,
            SensorKind::GyroscopeUncalibrated => type_tag::GYROSCOPE_UNCALIBRATED,
            SensorKind::Proximity => type_tag::PROXIMITY,
            SensorKind::Light => type_tag::LIGHT,
        }
    }

    /// Resolve a vendor type tag; `None` for anything outside the recognized set
    pub const fn from_type_tag(tag: i32) -> Option<Self> {
        match tag {
            type_tag::ACCELEROMETER => Some(SensorKind::Accelerometer),
            type_tag::MAGNETIC_FIELD => Some(SensorKind::MagneticField),
            type_tag::MAGNETIC_FIELD_UNCALIBRATED => Some(SensorKind::MagneticFieldUncalibrated),
            type_tag::GYROSCOPE => Some(SensorKind::Gyroscope),
            type_tag::GYROSCOPE_UNCALIBRATED => Some(SensorKind::GyroscopeUncalibrated),
            type_tag::PROXIMITY => Some(SensorKind::Proximity),
            type_tag::LIGHT => Some(SensorKind::Light),
            _ => None,
        }
    }

    /// Short name used in logs and metric labels
    pub const fn as_str(self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::MagneticField => "magnetic_field",
            SensorKind::MagneticFieldUncalibrated => "magnetic_field_uncalibrated",
            SensorKind::Gyroscope => "gyroscope",
            SensorKind::GyroscopeUncalibrated => "gyroscope_uncalibrated",
            SensorKind::Proximity => "proximity",
            SensorKind::Light => "light",
        }
    }
}

/// One hardware-reported reading in vendor layout.
///
/// Owned by the poll buffer; overwritten on the next poll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSensorEvent {
    /// Record version
    pub version: i32,

    /// Sensor handle that produced the event
    pub sensor: i32,

    /// Vendor type tag
    #[serde(rename = "type")]
    pub type_tag: i32,

    /// Driver timestamp (nanoseconds)
    pub timestamp: i64,

    /// Type-dependent data area
    pub data: [f32; RAW_DATA_LEN],

    /// Accuracy status of vector readings
    #[serde(default)]
    pub status: i8,
}

impl Default for RawSensorEvent {
    fn default() -> Self {
        Self {
            version: RAW_EVENT_VERSION,
            sensor: 0,
            type_tag: 0,
            timestamp: 0,
            data: [0.0; RAW_DATA_LEN],
            status: 0,
        }
    }
}

/// 3-axis view of the data area (`v[0..3]` + status)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawVector {
    pub v: [f32; 3],
    pub status: i8,
}

/// Uncalibrated view of the data area: two separate 3-float arrays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawUncalibrated {
    pub uncalib: [f32; 3],
    pub bias: [f32; 3],
}

impl RawSensorEvent {
    /// Create an event header with an empty data area
    pub fn new(type_tag: i32, sensor: i32, timestamp: i64) -> Self {
        Self {
            sensor,
            type_tag,
            timestamp,
            ..Default::default()
        }
    }

    /// Fill the data area with a 3-axis reading
    pub fn with_vector(mut self, v: [f32; 3], status: i8) -> Self {
        self.data[..3].copy_from_slice(&v);
        self.status = status;
        self
    }

    /// Fill the data area with an uncalibrated reading and its bias estimate
    pub fn with_uncalibrated(mut self, uncalib: [f32; 3], bias: [f32; 3]) -> Self {
        self.data[..3].copy_from_slice(&uncalib);
        self.data[3..6].copy_from_slice(&bias);
        self
    }

    /// Fill the data area with a scalar reading (distance, lux)
    pub fn with_scalar(mut self, value: f32) -> Self {
        self.data[0] = value;
        self
    }

    /// Recognized kind of this event, if any
    pub fn kind(&self) -> Option<SensorKind> {
        SensorKind::from_type_tag(self.type_tag)
    }

    pub fn vector(&self) -> RawVector {
        RawVector {
            v: [self.data[0], self.data[1], self.data[2]],
            status: self.status,
        }
    }

    pub fn uncalibrated(&self) -> RawUncalibrated {
        RawUncalibrated {
            uncalib: [self.data[0], self.data[1], self.data[2]],
            bias: [self.data[3], self.data[4], self.data[5]],
        }
    }

    /// Proximity distance (cm)
    pub fn distance(&self) -> f32 {
        self.data[0]
    }

    /// Ambient light (lux)
    pub fn light(&self) -> f32 {
        self.data[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_mapping_is_bijective() {
        for kind in SensorKind::ALL {
            assert_eq!(SensorKind::from_type_tag(kind.type_tag()), Some(kind));
        }
    }

    #[test]
    fn test_unrecognized_tags() {
        assert_eq!(SensorKind::from_type_tag(type_tag::ADDITIONAL_INFO), None);
        assert_eq!(
            SensorKind::from_type_tag(type_tag::ACCELEROMETER_UNCALIBRATED),
            None
        );
        assert_eq!(SensorKind::from_type_tag(999), None);
    }

    #[test]
    fn test_uncalibrated_view_reads_both_arrays() {
        let event = RawSensorEvent::new(type_tag::GYROSCOPE_UNCALIBRATED, 8, 10)
            .with_uncalibrated([1.0, 2.0, 3.0], [0.1, 0.2, 0.3]);

        let view = event.uncalibrated();
        assert_eq!(view.uncalib, [1.0, 2.0, 3.0]);
        assert_eq!(view.bias, [0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_serde_uses_vendor_field_name() {
        let event = RawSensorEvent::new(type_tag::LIGHT, 14, 42).with_scalar(500.0);
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["type"], 5);
        assert_eq!(json["sensor"], 14);
    }
}
