//! Driver session error types

use contracts::{DriverError, ModuleLoadError};
use thiserror::Error;

/// Driver session specific error
#[derive(Debug, Error)]
pub enum SessionError {
    /// Module could not be bound
    #[error(transparent)]
    ModuleLoad(#[from] ModuleLoadError),

    /// Device could not be opened
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Every allowed attempt failed
    #[error("driver session not opened after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<SessionError>,
    },
}

/// Result alias
pub type Result<T> = std::result::Result<T, SessionError>;
