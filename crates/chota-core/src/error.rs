use thiserror::Error;

/// Errors related to the core encoding functionality.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
}

/// Errors returned by repository implementations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("record conflict could not be resolved: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Returns `true` for failures of the backend itself, as opposed to
    /// rejected or unreadable data.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StorageError::Unavailable(_) | StorageError::Timeout(_) | StorageError::Operation(_)
        )
    }
}
