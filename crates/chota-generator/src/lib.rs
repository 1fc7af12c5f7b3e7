pub mod error;
pub mod seq;

pub use error::GeneratorError;
pub use seq::SequenceGenerator;

use chota_snowflake::{Clock, Snowflake};

/// Trait for producing record ids.
///
/// Implementations are pure generators that don't interact with storage.
/// Every id they hand out must be non-negative and never repeat for the
/// lifetime of the deployment, so it can be encoded into a short code.
pub trait IdGenerator: Send + Sync + 'static {
    /// Produces the next globally unique id.
    fn next_id(&self) -> Result<i64, GeneratorError>;
}

impl<C: Clock + 'static> IdGenerator for Snowflake<C> {
    fn next_id(&self) -> Result<i64, GeneratorError> {
        Ok(Snowflake::next_id(self)?)
    }
}
