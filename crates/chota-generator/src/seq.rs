use crate::{GeneratorError, IdGenerator};
use std::sync::atomic::{AtomicI64, Ordering};

/// A single-process id generator backed by an atomic counter.
///
/// Produces `offset, offset + 1, ...`. Useful for deterministic tests and
/// single-node development where Snowflake's time component gets in the way.
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    counter: AtomicI64,
}

impl SequenceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator whose first id is `offset`.
    ///
    /// Negative offsets are clamped to zero.
    pub fn starting_at(offset: i64) -> Self {
        Self {
            counter: AtomicI64::new(offset.max(0)),
        }
    }
}

impl IdGenerator for SequenceGenerator {
    fn next_id(&self) -> Result<i64, GeneratorError> {
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        // fetch_add wraps, so anything negative means we ran past i64::MAX
        if id < 0 {
            return Err(GeneratorError::Exhausted);
        }
        Ok(id)
    }
}
