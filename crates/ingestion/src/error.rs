//! Ingestion error types

use contracts::ContractError;
use driver_session::SessionError;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// No driver session could be established
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Registry could not be built from configuration
    #[error("invalid sensor registry: {0}")]
    Registry(#[from] ContractError),
}

/// Ingestion Result alias
pub type Result<T> = std::result::Result<T, IngestionError>;
