use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid data for key {key}: {reason}")]
    InvalidData { key: String, reason: String },

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Storage error: {0}")]
    Other(String),
}
