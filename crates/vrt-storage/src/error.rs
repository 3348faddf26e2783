//! Error types for vrt-storage

use std::path::PathBuf;
use thiserror::Error;
use vrt_core::ErrorKind;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{} is not valid JSON and was left untouched: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Timed out waiting for lock on {}", .0.display())]
    LockTimeout(PathBuf),

    #[error("Commit not found in history: {0}")]
    CommitNotFound(String),

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::CommitNotFound(_) => ErrorKind::NotFound,
            StorageError::Corrupt { .. } | StorageError::Invalid(_) => ErrorKind::InvalidInput,
            StorageError::LockTimeout(_)
            | StorageError::Serialization(_)
            | StorageError::Io(_) => ErrorKind::IoFailure,
        }
    }
}

impl From<tempfile::PersistError> for StorageError {
    fn from(e: tempfile::PersistError) -> Self {
        StorageError::Io(e.error)
    }
}
