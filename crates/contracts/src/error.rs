//! Layered error definitions
//!
//! Categorized by source: config / module load / driver / sink

use thiserror::Error;

use crate::SensorHandle;

/// Failure to bind a driver module.
///
/// Always fatal for the acquisition attempt: no session is ever built on top
/// of a module that failed to load.
#[derive(Debug, Error)]
pub enum ModuleLoadError {
    /// Module binary (or in-process instance) does not exist
    #[error("module '{instance}' not found: {message}")]
    NotFound { instance: String, message: String },

    /// Module exists but does not export its module-info entry
    #[error("module '{instance}' has no '{symbol}' entry")]
    SymbolMissing { instance: String, symbol: String },

    /// Module reports a different identifier than the requested class
    #[error("module id mismatch: requested '{expected}', module reports '{found}'")]
    IdMismatch { expected: String, found: String },
}

impl ModuleLoadError {
    /// Create module not found error
    pub fn not_found(instance: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            instance: instance.into(),
            message: message.into(),
        }
    }
}

/// Errors reported by an open (or opening) driver device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// Device could not be opened from a valid module
    #[error("failed to open device: {message}")]
    Open { message: String },

    /// Negative poll result
    #[error("poll failed with status {code}")]
    Poll { code: i32 },

    /// activate() rejected
    #[error("activate(handle={handle}, enabled={enabled}) failed with status {code}")]
    Activate {
        handle: SensorHandle,
        enabled: bool,
        code: i32,
    },

    /// setDelay() rejected
    #[error("set_delay(handle={handle}) failed with status {code}")]
    SetDelay { handle: SensorHandle, code: i32 },

    /// close() reported a failure
    #[error("failed to close device: {message}")]
    Close { message: String },
}

impl DriverError {
    /// Create device open error
    pub fn open(message: impl Into<String>) -> Self {
        Self::Open {
            message: message.into(),
        }
    }
}

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Driver Errors =====
    /// Module binding error
    #[error(transparent)]
    ModuleLoad(#[from] ModuleLoadError),

    /// Device error
    #[error(transparent)]
    Driver(#[from] DriverError),

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
