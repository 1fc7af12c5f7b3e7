use chota_core::{CoreError, StorageError};
use chota_generator::GeneratorError;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, ShortenerError>;

/// Coarse classification of a [`ShortenerError`], for mapping onto a
/// transport's status codes (400, 404, 409, 503 and 500 respectively).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Unavailable,
    Internal,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShortenerError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    StoreUnavailable(String),
    #[error("id generation failed: {0}")]
    Generator(String),
}

impl ShortenerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShortenerError::Validation(_) => ErrorKind::Validation,
            ShortenerError::NotFound(_) => ErrorKind::NotFound,
            ShortenerError::Conflict(_) => ErrorKind::Conflict,
            ShortenerError::StoreUnavailable(_) => ErrorKind::Unavailable,
            ShortenerError::Generator(_) => ErrorKind::Internal,
        }
    }
}

impl From<GeneratorError> for ShortenerError {
    fn from(err: GeneratorError) -> Self {
        error!(error = %err, "Failed to generate an id");
        ShortenerError::Generator(err.to_string())
    }
}

impl From<CoreError> for ShortenerError {
    fn from(err: CoreError) -> Self {
        error!(error = %err, "Generated id cannot be encoded");
        ShortenerError::Generator(err.to_string())
    }
}

/// Storage failures are logged in full here; callers only see a generic
/// message.
impl From<StorageError> for ShortenerError {
    fn from(err: StorageError) -> Self {
        error!(error = %err, transient = err.is_transient(), "Durable store operation failed");
        match err {
            StorageError::Conflict(_) => {
                ShortenerError::Conflict("the short URL could not be created, retry".to_string())
            }
            _ => ShortenerError::StoreUnavailable(
                "the service is temporarily unavailable".to_string(),
            ),
        }
    }
}
