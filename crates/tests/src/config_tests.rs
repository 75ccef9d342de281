//! Configuration loading

use std::io::Write;

use config_loader::{ConfigFormat, ConfigLoader};
use contracts::{ContractError, SinkType};

fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_toml_registry() {
    let file = write_config(
        ".toml",
        r#"
        [driver]
        instance = "simulated"

        [[sensors]]
        handle = 9
        name = "gyroscope"
        interval_ms = 10

        [[sensors]]
        handle = 15
        name = "accelerometer"
        interval_ms = 10
        offroad = true

        [power]
        check_every = 5

        [state]
        listen_addr = "127.0.0.1:7700"

        [[sinks]]
        name = "out"
        sink_type = "file"
        params = { path = "/tmp/sensord" }
        "#,
    );

    let blueprint = ConfigLoader::load_from_path(file.path()).unwrap();
    let registry = blueprint.to_registry().unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get(15).unwrap().sampling_interval_ns, 10_000_000);
    assert_eq!(registry.offroad().count(), 1);
    assert_eq!(blueprint.power.check_every, 5);
    assert_eq!(blueprint.state.listen_addr.as_deref(), Some("127.0.0.1:7700"));
    assert_eq!(blueprint.sinks[0].sink_type, SinkType::File);
    assert_eq!(blueprint.sinks[0].queue_capacity, 100);
}

#[test]
fn test_load_json_defaults() {
    let file = write_config(".json", r#"{ "publish": { "channel": "imu" } }"#);

    let blueprint = ConfigLoader::load_from_path(file.path()).unwrap();
    assert_eq!(blueprint.publish.channel, "imu");
    assert_eq!(blueprint.sensors.len(), 7);
    assert_eq!(blueprint.acquisition.batch_capacity, 16);
}

#[test]
fn test_duplicate_handles_rejected() {
    let result = ConfigLoader::load_from_str(
        r#"
        [[sensors]]
        handle = 9
        interval_ms = 10

        [[sensors]]
        handle = 9
        interval_ms = 20
        offroad = true
        "#,
        ConfigFormat::Toml,
    );
    assert!(matches!(result, Err(ContractError::ConfigValidation { .. })));
}

#[test]
fn test_unknown_extension_rejected() {
    let file = write_config(".yaml", "sensors: []");
    assert!(ConfigLoader::load_from_path(file.path()).is_err());
}

#[test]
fn test_serialized_defaults_load_back() {
    let toml = ConfigLoader::to_toml(&contracts::SensordBlueprint::default()).unwrap();
    let blueprint = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
    assert_eq!(blueprint.sensors.len(), 7);
}
