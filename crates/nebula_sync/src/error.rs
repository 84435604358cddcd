use nebula_core::ControlError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Window record encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("Rejected edit: {0}")]
    Control(#[from] ControlError),

    #[error("Window registry is not initialised")]
    NotInitialised,
}

pub type Result<T> = std::result::Result<T, SyncError>;
