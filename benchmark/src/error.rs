//! @ai:module:intent Error taxonomy for benchmark run tracking
//! @ai:module:layer domain
//! @ai:module:public_api TrackerError, Result
//! @ai:module:stateless true

use rusqlite::ErrorCode;
use thiserror::Error;

/// @ai:intent Unified error type for all tracker and store operations
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Already finished: {0}")]
    AlreadyFinished(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl TrackerError {
    /// @ai:intent Stable machine-readable name of the error kind
    /// @ai:effects pure
    pub fn kind(&self) -> &'static str {
        match self {
            TrackerError::NotFound(_) => "NOT_FOUND",
            TrackerError::DuplicateKey(_) => "DUPLICATE_KEY",
            TrackerError::AlreadyFinished(_) => "ALREADY_FINISHED",
            TrackerError::Validation(_) => "VALIDATION_ERROR",
            TrackerError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<rusqlite::Error> for TrackerError {
    fn from(err: rusqlite::Error) -> Self {
        TrackerError::Storage(err.to_string())
    }
}

/// @ai:intent Replace a SQLite constraint violation with a domain error, anything else is Storage
/// @ai:effects pure
pub(crate) fn on_constraint_violation(
    err: rusqlite::Error,
    mapped: impl FnOnce() -> TrackerError,
) -> TrackerError {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            mapped()
        }
        other => other.into(),
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
