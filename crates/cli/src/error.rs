//! Error types for CLI operations.

use thiserror::Error;

/// Errors raised while orchestrating a daemon run
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration failed to load or validate
    #[error("failed to load configuration: {0}")]
    Config(#[from] contracts::ContractError),

    /// Dispatcher or state listener setup failed
    #[error("dispatcher setup failed: {0}")]
    Dispatcher(#[from] dispatcher::DispatcherError),

    /// The acquisition daemon stopped with an error
    #[error("daemon failed: {0}")]
    Daemon(#[from] ingestion::IngestionError),

    /// Signal handlers could not be installed
    #[error("failed to install {signal} handler: {source}")]
    Signal {
        signal: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Background task panicked or was cancelled
    #[error("task '{task}' did not complete: {message}")]
    Task { task: &'static str, message: String },

    /// Metrics exporter error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn task(task: &'static str, message: impl Into<String>) -> Self {
        Self::Task {
            task,
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
