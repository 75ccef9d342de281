//! Config validation
//!
//! Rules:
//! - numeric ranges and non-empty names (derived `Validate`)
//! - at least one sensor, handles unique
//! - offroad set is a strict, non-empty subset of the registry (when power management is on)
//! - replay instance has a `[driver.replay]` section
//! - sink names unique

use std::collections::HashSet;

use ::validator::Validate;
use contracts::{ContractError, SensordBlueprint};

/// Validate a SensordBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &SensordBlueprint) -> Result<(), ContractError> {
    validate_ranges(blueprint)?;
    validate_sensor_handles(blueprint)?;
    validate_offroad_set(blueprint)?;
    validate_driver(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

fn validate_ranges(blueprint: &SensordBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("blueprint", e.to_string()))
}

fn validate_sensor_handles(blueprint: &SensordBlueprint) -> Result<(), ContractError> {
    if blueprint.sensors.is_empty() {
        return Err(ContractError::config_validation(
            "sensors",
            "at least one sensor is required",
        ));
    }

    let mut seen = HashSet::new();
    for sensor in &blueprint.sensors {
        if !seen.insert(sensor.handle) {
            return Err(ContractError::config_validation(
                format!("sensors[handle={}]", sensor.handle),
                "duplicate sensor handle",
            ));
        }
    }
    Ok(())
}

fn validate_offroad_set(blueprint: &SensordBlueprint) -> Result<(), ContractError> {
    if !blueprint.power.enabled {
        return Ok(());
    }

    let offroad = blueprint.sensors.iter().filter(|s| s.offroad).count();
    if offroad == 0 {
        return Err(ContractError::config_validation(
            "sensors[].offroad",
            "low-power mode needs at least one offroad sensor",
        ));
    }
    if offroad == blueprint.sensors.len() {
        return Err(ContractError::config_validation(
            "sensors[].offroad",
            "every sensor is offroad; low-power mode would change nothing",
        ));
    }
    Ok(())
}

fn validate_driver(blueprint: &SensordBlueprint) -> Result<(), ContractError> {
    let driver = &blueprint.driver;
    if driver.instance.as_deref() == Some("replay") && driver.replay.is_none() {
        return Err(ContractError::config_validation(
            "driver.replay",
            "instance 'replay' requires a [driver.replay] section",
        ));
    }
    Ok(())
}

fn validate_sinks(blueprint: &SensordBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}
