//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::SensordBlueprint;
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    driver: DriverInfo,
    sensors: Vec<SensorInfo>,
    power: PowerInfo,
    channel: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct DriverInfo {
    class_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    instance: Option<String>,
    poll_timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    replay_path: Option<String>,
}

#[derive(Serialize)]
struct SensorInfo {
    handle: i32,
    name: String,
    sampling_interval_ns: i64,
    offroad: bool,
}

#[derive(Serialize)]
struct PowerInfo {
    enabled: bool,
    check_every: u64,
    state_topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    listen_addr: Option<String>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = ?args.config, "loading configuration info");

    let blueprint = load_blueprint(args.config.as_deref()).context("failed to load configuration")?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &SensordBlueprint, args: &InfoArgs) -> ConfigInfo {
    let sensors = blueprint
        .sensors
        .iter()
        .map(|s| {
            let descriptor = s.descriptor();
            SensorInfo {
                handle: descriptor.handle,
                name: s.name.clone(),
                sampling_interval_ns: descriptor.sampling_interval_ns,
                offroad: descriptor.offroad,
            }
        })
        .collect();

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        driver: DriverInfo {
            class_id: blueprint.driver.class_id.clone(),
            instance: blueprint.driver.instance.clone(),
            poll_timeout_ms: blueprint.driver.poll_timeout_ms,
            replay_path: blueprint.driver.replay.as_ref().map(|r| r.path.clone()),
        },
        sensors,
        power: PowerInfo {
            enabled: blueprint.power.enabled,
            check_every: blueprint.power.check_every,
            state_topic: blueprint.power.state_topic.clone(),
            listen_addr: blueprint.state.listen_addr.clone(),
        },
        channel: blueprint.publish.channel.clone(),
        sinks,
    }
}

fn print_config_info(blueprint: &SensordBlueprint, args: &InfoArgs) {
    println!("sensord configuration\n");

    println!("Driver");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Module class: {}", blueprint.driver.class_id);
    println!(
        "   ├─ Instance: {}",
        blueprint.driver.instance.as_deref().unwrap_or("(default)")
    );
    println!("   └─ Poll timeout: {} ms", blueprint.driver.poll_timeout_ms);

    println!("\nSensors ({})", blueprint.sensors.len());
    for (i, sensor) in blueprint.sensors.iter().enumerate() {
        let prefix = if i == blueprint.sensors.len() - 1 { "└─" } else { "├─" };
        println!(
            "   {} [{:>2}] {} every {} ms{}",
            prefix,
            sensor.handle,
            sensor.name,
            sensor.interval_ms,
            if sensor.offroad { " (offroad)" } else { "" }
        );
    }

    let power = &blueprint.power;
    println!("\nPower");
    println!("   ├─ Enabled: {}", power.enabled);
    println!("   ├─ Check every: {} batches", power.check_every);
    println!("   ├─ State topic: {}", power.state_topic);
    println!(
        "   └─ State listener: {}",
        blueprint.state.listen_addr.as_deref().unwrap_or("(none)")
    );

    println!("\nPublish channel: {}", blueprint.publish.channel);

    if args.sinks && !blueprint.sinks.is_empty() {
        println!("\nSinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let prefix = if i == blueprint.sinks.len() - 1 { "└─" } else { "├─" };
            println!(
                "   {} {} ({:?}, queue {})",
                prefix, sink.name, sink.sink_type, sink.queue_capacity
            );
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_from_defaults() {
        let args = InfoArgs {
            config: None,
            json: true,
            sinks: true,
        };
        let info = build_config_info(&SensordBlueprint::default(), &args);

        assert_eq!(info.sensors.len(), 7);
        assert_eq!(info.sensors[2].handle, 8);
        assert_eq!(info.sensors[2].sampling_interval_ns, 10_000_000);
        assert!(info.sensors[2].offroad);
        assert_eq!(info.sinks.len(), 1);
        assert_eq!(info.channel, "sensorEvents");
    }

    #[test]
    fn test_sinks_hidden_by_default() {
        let args = InfoArgs {
            config: None,
            json: true,
            sinks: false,
        };
        let info = build_config_info(&SensordBlueprint::default(), &args);
        assert!(info.sinks.is_empty());
    }
}
