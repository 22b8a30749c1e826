//! Error types raised by repository implementations.

use thiserror::Error;

/// Errors surfaced by profile store implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted profile store at {path}: {reason}")]
    CorruptedData { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
