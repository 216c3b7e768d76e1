//! Error types for pump-import

use crate::services::LastFmError;
use thiserror::Error;

/// Reasons an import run aborts
#[derive(Debug, Error)]
pub enum ImportError {
    /// Transport or decode failure talking to the remote source
    #[error("Failed to fetch listens: {0}")]
    Fetch(#[from] LastFmError),

    /// Persistence failure while reading the checkpoint or writing the import
    #[error("Failed to persist import: {0}")]
    Store(#[from] pump_common::Error),
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;
