//! Built-in module loader
//!
//! Maps instance names to in-process module factories. The requested class id
//! is checked against the id the bound module reports.

use std::collections::BTreeMap;
use std::time::Duration;

use contracts::{DriverConfig, ModuleLoadError, ModuleLoader, SensorModule};
use tracing::debug;

use crate::replay::ReplayModule;
use crate::simulated::SimulatedModule;

/// Builds a fresh module each time it is loaded
pub type ModuleFactory =
    Box<dyn Fn() -> Result<Box<dyn SensorModule>, ModuleLoadError> + Send + Sync>;

/// Instance used when no hint is given
pub const DEFAULT_INSTANCE: &str = "simulated";

/// Loader over a fixed table of in-process modules
pub struct BuiltinModuleLoader {
    factories: BTreeMap<String, ModuleFactory>,
}

impl BuiltinModuleLoader {
    /// Empty loader; every lookup fails until modules are registered
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Loader with the modules available for `driver`
    ///
    /// `simulated` is always registered; `replay` only when configured.
    pub fn from_config(driver: &DriverConfig) -> Self {
        let poll_timeout = Duration::from_millis(driver.poll_timeout_ms);
        let mut loader = Self::empty();

        loader.register("simulated", move || {
            Ok(Box::new(SimulatedModule::new(poll_timeout)) as Box<dyn SensorModule>)
        });

        if let Some(replay) = driver.replay.clone() {
            loader.register("replay", move || {
                let module = ReplayModule::load(&replay, poll_timeout)?;
                Ok(Box::new(module) as Box<dyn SensorModule>)
            });
        }

        loader
    }

    /// Register (or replace) an instance
    pub fn register<F>(&mut self, instance: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Box<dyn SensorModule>, ModuleLoadError> + Send + Sync + 'static,
    {
        self.factories.insert(instance.into(), Box::new(factory));
    }

    /// Registered instance names
    pub fn instances(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl ModuleLoader for BuiltinModuleLoader {
    fn load_module(
        &self,
        class_id: &str,
        instance: Option<&str>,
    ) -> Result<Box<dyn SensorModule>, ModuleLoadError> {
        let name = instance.unwrap_or(DEFAULT_INSTANCE);

        let factory = self.factories.get(name).ok_or_else(|| {
            let available: Vec<_> = self.instances().collect();
            ModuleLoadError::not_found(name, format!("available: [{}]", available.join(", ")))
        })?;

        let module = factory()?;
        if module.id() != class_id {
            return Err(ModuleLoadError::IdMismatch {
                expected: class_id.to_string(),
                found: module.id().to_string(),
            });
        }

        debug!(instance = name, module = module.name(), "module bound");
        Ok(module)
    }
}
