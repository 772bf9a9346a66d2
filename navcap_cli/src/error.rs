//! Error types for the navcap CLI.

use navcap_core::storage::StorageError;
use navcap_core::{CaptureError, ConfigError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid replay script: {0}")]
    Script(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
