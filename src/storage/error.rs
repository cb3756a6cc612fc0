use std::path::PathBuf;

use thiserror::Error;

use crate::domain::error::MetadataError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("metadata record not found at {}", .0.to_string_lossy())]
    NotFound(PathBuf),

    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),

    #[error("malformed metadata record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid metadata record: {0}")]
    Invalid(#[from] MetadataError),
}
