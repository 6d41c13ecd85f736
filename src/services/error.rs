use std::path::PathBuf;

use thiserror::Error;

use crate::application::error::ApplicationError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Cannot create upload directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot read upload directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Cannot decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Cannot assemble PDF: {0}")]
    Encode(#[from] lopdf::Error),

    #[error("Cannot write PDF {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Generation task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

impl From<StorageError> for ApplicationError {
    fn from(error: StorageError) -> Self {
        ApplicationError::InternalError(format!("Storage error: {}", error))
    }
}

impl From<GenerationError> for ApplicationError {
    fn from(error: GenerationError) -> Self {
        ApplicationError::GenerationFailed(error.to_string())
    }
}
