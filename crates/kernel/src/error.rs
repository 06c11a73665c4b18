//! Kernel error types.

use thiserror::Error;
use uuid::Uuid;

use crate::derivative::BackendError;

/// Errors surfaced by the storage and derivative services.
#[derive(Debug, Error)]
pub enum DepotError {
    /// The declared or sniffed MIME type is not in the allow-list.
    #[error("file type \"{0}\" cannot be uploaded")]
    DisallowedType(String),

    #[error("file too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("upload contains no file")]
    EmptyUpload,

    #[error("file not found: {0}")]
    NotFound(Uuid),

    /// A stored path or target name that would leave the store.
    #[error("invalid storage path: {0:?}")]
    InvalidPath(String),

    #[error("invalid target dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("image backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("image processing task failed")]
    Task(#[from] tokio::task::JoinError),

    #[error("image processing unavailable")]
    Unavailable(#[from] tokio::sync::AcquireError),
}

/// Result type alias using DepotError.
pub type DepotResult<T> = Result<T, DepotError>;
