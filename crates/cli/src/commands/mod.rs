//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_daemon;
pub use validate::run_validate;

use std::path::Path;

use config_loader::ConfigLoader;
use contracts::SensordBlueprint;
use tracing::info;

use crate::error::{CliError, Result};

/// Load `path`, or fall back to the validated built-in defaults
pub(crate) fn load_blueprint(path: Option<&Path>) -> Result<SensordBlueprint> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()));
            }
            info!(config = %path.display(), "loading configuration");
            Ok(ConfigLoader::load_from_path(path)?)
        }
        None => {
            info!("no configuration file given, using built-in defaults");
            let blueprint = SensordBlueprint::default();
            ConfigLoader::validate(&blueprint)?;
            Ok(blueprint)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_no_path() {
        let blueprint = load_blueprint(None).unwrap();
        assert_eq!(blueprint.sensors.len(), 7);
    }

    #[test]
    fn test_missing_file() {
        let err = load_blueprint(Some(Path::new("/nonexistent/sensord.toml"))).unwrap_err();
        assert!(matches!(err, CliError::ConfigNotFound { .. }));
    }
}
