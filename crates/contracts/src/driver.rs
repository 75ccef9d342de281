//! Driver contract - module loader, hardware module and device
//!
//! Models the fixed vendor ABI as three narrow traits so the acquisition core
//! never depends on how a module is located or how a device talks to hardware.

use serde::{Deserialize, Serialize};

use crate::{DriverError, ModuleLoadError, RawSensorEvent, SensorHandle};

/// Class identifier of sensor hardware modules
pub const SENSORS_HARDWARE_MODULE_ID: &str = "sensors";

/// Sensor description returned by device enumeration (diagnostics only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorInfo {
    /// Driver handle
    pub handle: SensorHandle,

    /// Human-readable name
    pub name: String,

    /// Vendor type tag
    #[serde(rename = "type")]
    pub type_tag: i32,

    /// Fastest supported interval (µs)
    pub min_delay_us: i32,

    /// Slowest supported interval (µs)
    pub max_delay_us: i64,
}

/// Resolves a module class (and optional instance hint) to a module.
///
/// Implementations must fail with a descriptive [`ModuleLoadError`] instead of
/// returning a module that cannot be opened.
pub trait ModuleLoader: Send + Sync {
    fn load_module(
        &self,
        class_id: &str,
        instance: Option<&str>,
    ) -> Result<Box<dyn SensorModule>, ModuleLoadError>;
}

/// A bound hardware module (the module descriptor).
pub trait SensorModule: Send {
    /// Module identifier, compared against the requested class id
    fn id(&self) -> &str;

    /// Module display name
    fn name(&self) -> &str;

    /// Open a device connection
    fn open(&self) -> Result<Box<dyn SensorDevice>, DriverError>;
}

/// An open device connection.
///
/// All calls are made from the single acquisition thread.
pub trait SensorDevice: Send {
    /// Enumerate the sensors this device exposes
    fn sensor_list(&self) -> Vec<SensorInfo>;

    /// Enable or disable event production for a sensor
    fn activate(&mut self, handle: SensorHandle, enabled: bool) -> Result<(), DriverError>;

    /// Request a sampling interval (nanoseconds); the driver may not honor it exactly
    fn set_delay(&mut self, handle: SensorHandle, delay_ns: i64) -> Result<(), DriverError>;

    /// Block until events are available or the driver's internal timeout elapses.
    ///
    /// Fills at most `buffer.len()` events from the start of `buffer` and
    /// returns how many were written. `Ok(0)` means nothing arrived.
    fn poll(&mut self, buffer: &mut [RawSensorEvent]) -> Result<usize, DriverError>;

    /// Release the connection. Called exactly once per opened device.
    fn close(&mut self) -> Result<(), DriverError>;
}
