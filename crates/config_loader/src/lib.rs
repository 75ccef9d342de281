//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `SensordBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("sensord.toml")).unwrap();
//! println!("Sensors: {}", blueprint.sensors.len());
//! ```

mod parser;
mod validator;

pub use contracts::SensordBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<SensordBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<SensordBlueprint, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an in-memory blueprint (e.g. the built-in defaults)
    pub fn validate(blueprint: &SensordBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    /// Serialize SensordBlueprint to TOML string
    pub fn to_toml(blueprint: &SensordBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize SensordBlueprint to JSON string
    pub fn to_json(blueprint: &SensordBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<SensordBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_TOML: &str = r#"
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

[[sinks]]
name = "log_sink"
sink_type = "log"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.sensors.len(), 2);
        assert_eq!(bp.to_registry().unwrap().offroad().count(), 1);
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.sensors.len(), bp2.sensors.len());
        assert_eq!(bp.sinks[0].name, bp2.sinks[0].name);
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.sensors[1].handle, bp2.sensors[1].handle);
    }

    #[test]
    fn test_validation_error_surfaces() {
        let content = r#"
[[sensors]]
handle = 1
interval_ms = 10
offroad = true

[[sensors]]
handle = 1
interval_ms = 10
"#;
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
    }

    #[test]
    fn test_load_from_path() {
        let dir = std::env::temp_dir().join(format!("sensord-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sensord.toml");
        std::fs::write(&path, MINIMAL_TOML).unwrap();

        let bp = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(bp.sensors[0].handle, 9);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ConfigLoader::load_from_path(Path::new("sensord.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }
}
