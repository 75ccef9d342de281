//! Driver session - one open device connection
//!
//! Owns the device for its whole lifetime and guarantees `close` runs exactly
//! once, either explicitly or on drop.

use contracts::{DriverConfig, DriverError, ModuleLoader, SensorDevice, SensorInfo};
use tracing::{info, instrument, warn};

use crate::error::Result;

/// An open device connection
pub struct DriverSession {
    module_name: String,
    device: Box<dyn SensorDevice>,
    sensors: Vec<SensorInfo>,
    attempts: u32,
    closed: bool,
}

impl DriverSession {
    /// Bind the configured module, open its device and enumerate sensors.
    ///
    /// A module that fails to load never gets a device opened on it.
    #[instrument(
        name = "driver_session_open",
        skip(loader, driver),
        fields(class_id = %driver.class_id, instance = ?driver.instance)
    )]
    pub fn open(loader: &dyn ModuleLoader, driver: &DriverConfig) -> Result<Self> {
        let module = loader.load_module(&driver.class_id, driver.instance.as_deref())?;
        let device = module.open()?;
        let sensors = device.sensor_list();

        info!(
            module = module.name(),
            sensor_count = sensors.len(),
            "device opened"
        );
        for sensor in &sensors {
            info!(
                handle = sensor.handle,
                name = %sensor.name,
                sensor_type = sensor.type_tag,
                min_delay_us = sensor.min_delay_us,
                max_delay_us = sensor.max_delay_us,
                "sensor available"
            );
        }

        Ok(Self {
            module_name: module.name().to_string(),
            device,
            sensors,
            attempts: 1,
            closed: false,
        })
    }

    pub(crate) fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Sensors enumerated at open time
    pub fn sensors(&self) -> &[SensorInfo] {
        &self.sensors
    }

    /// Open attempts it took to obtain this session (1 = first try)
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn device_mut(&mut self) -> &mut dyn SensorDevice {
        self.device.as_mut()
    }

    /// Close the device
    pub fn close(mut self) -> std::result::Result<(), DriverError> {
        self.closed = true;
        let result = self.device.close();
        info!(module = %self.module_name, "device closed");
        result
    }
}

impl Drop for DriverSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.device.close() {
            warn!(module = %self.module_name, error = %e, "device close on drop failed");
        }
    }
}
