use thiserror::Error;

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Failures of a key-value cache client.
///
/// These never escape the distributed cache wrapper; they are counted and
/// logged there and turned into misses.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            CacheError::InvalidData(err.to_string())
        } else {
            CacheError::Serialization(err.to_string())
        }
    }
}
