use modular_bitfield::prelude::*;
use std::fmt;

#[bitfield]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnowflakeId {
    /// 12 bits for sequence number (resets every millisecond).
    pub sequence: B12,
    /// 10 bits for worker ID (allows up to 1024 workers).
    pub worker_id: B10,
    /// 41 bits for timestamp (milliseconds since a custom epoch).
    pub timestamp: B41,
    /// Sign bit, always zero.
    #[skip]
    __: B1,
}

impl SnowflakeId {
    /// Splits a generated id back into its fields.
    pub fn from_i64(id: i64) -> Self {
        Self::from_bytes(id.to_le_bytes())
    }

    /// Packs the fields into a non-negative `i64`.
    pub fn as_i64(&self) -> i64 {
        i64::from_le_bytes(self.into_bytes())
    }
}

impl From<SnowflakeId> for i64 {
    fn from(id: SnowflakeId) -> Self {
        id.as_i64()
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("timestamp", &self.timestamp())
            .field("worker_id", &self.worker_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}
