//! Activation protocol
//!
//! Session start, per sensor in registry order: deactivate, activate, set
//! delay. Driver rejections are logged and counted but never abort the
//! protocol; the remaining sensors are still configured.

use contracts::{PowerMode, SensorDescriptor, SensorDevice, SensorRegistry};
use tracing::{debug, instrument, warn};

/// Outcome of one protocol run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Sensors enabled (activate + set_delay issued)
    pub enabled: usize,

    /// Sensors left disabled
    pub disabled: usize,

    /// Driver calls that reported an error
    pub failures: usize,
}

/// (Re)activate the full registry at session start
#[instrument(name = "activate_registry", skip_all, fields(sensors = registry.len()))]
pub fn activate_registry(
    device: &mut dyn SensorDevice,
    registry: &SensorRegistry,
) -> ActivationReport {
    let mut report = ActivationReport::default();

    for sensor in registry.iter() {
        deactivate(device, sensor, &mut report);
        enable(device, sensor, &mut report);
    }

    debug!(?report, "registry activated");
    report
}

/// Switch the active set to `mode`
///
/// Every monitored sensor is deactivated first; then the mode's set is
/// re-enabled in registry order with its configured delay.
#[instrument(name = "apply_power_mode", skip_all, fields(mode = mode.as_str()))]
pub fn apply_power_mode(
    device: &mut dyn SensorDevice,
    registry: &SensorRegistry,
    mode: PowerMode,
) -> ActivationReport {
    let mut report = ActivationReport::default();

    for sensor in registry.iter() {
        deactivate(device, sensor, &mut report);
    }
    for sensor in registry.iter() {
        if mode.includes(sensor) {
            enable(device, sensor, &mut report);
        } else {
            report.disabled += 1;
        }
    }

    debug!(?report, "power mode applied");
    report
}

fn deactivate(
    device: &mut dyn SensorDevice,
    sensor: &SensorDescriptor,
    report: &mut ActivationReport,
) {
    if let Err(e) = device.activate(sensor.handle, false) {
        report.failures += 1;
        observability::record_activation_failure(sensor.handle, "deactivate");
        warn!(handle = sensor.handle, error = %e, "deactivate failed");
    }
}

fn enable(
    device: &mut dyn SensorDevice,
    sensor: &SensorDescriptor,
    report: &mut ActivationReport,
) {
    if let Err(e) = device.activate(sensor.handle, true) {
        report.failures += 1;
        observability::record_activation_failure(sensor.handle, "activate");
        warn!(handle = sensor.handle, error = %e, "activate failed");
    }
    if let Err(e) = device.set_delay(sensor.handle, sensor.sampling_interval_ns) {
        report.failures += 1;
        observability::record_activation_failure(sensor.handle, "set_delay");
        warn!(handle = sensor.handle, error = %e, "set_delay failed");
    }
    report.enabled += 1;
}
