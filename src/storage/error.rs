use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing checkpoint files
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{} has no '{column}' column", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
