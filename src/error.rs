//! Error types for the Elidune catalog

use thiserror::Error;

use crate::repository::Dataset;

/// Catalog error codes, stable across releases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 3,
    NoSuchItem = 5,
    ItemNotAvailable = 7,
    Duplicate = 8,
    InvalidState = 13,
    BadValue = 18,
    PartialWrite = 22,
}

/// Main catalog error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Partial persistence: wrote {written:?}, failed {failed:?}")]
    PersistencePartial {
        written: Vec<Dataset>,
        failed: Vec<Dataset>,
    },

    #[error("Persistence failed for {failed:?}: {reason}")]
    PersistenceFailed { failed: Vec<Dataset>, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl AppError {
    /// Numeric code reported to callers that format results for display
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::DuplicateKey(_) => ErrorCode::Duplicate,
            AppError::NotFound(_) => ErrorCode::NoSuchItem,
            AppError::InvalidState(_) => ErrorCode::InvalidState,
            AppError::Unavailable(_) => ErrorCode::ItemNotAvailable,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::PersistencePartial { .. } => ErrorCode::PartialWrite,
            AppError::PersistenceFailed { .. } | AppError::Storage(_) => ErrorCode::DbFailure,
            AppError::Serialization(_) | AppError::Config(_) => ErrorCode::Failure,
        }
    }

    /// True for errors raised by the persistence layer during a mutation
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            AppError::PersistencePartial { .. }
                | AppError::PersistenceFailed { .. }
                | AppError::Storage(_)
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias for catalog operations
pub type AppResult<T> = Result<T, AppError>;
