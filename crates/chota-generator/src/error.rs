use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("snowflake: {0}")]
    Snowflake(#[from] chota_snowflake::Error),
    #[error("id space exhausted")]
    Exhausted,
}
