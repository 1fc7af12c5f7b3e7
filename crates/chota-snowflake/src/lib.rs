//! Snowflake-style 64-bit id generation.
//!
//! Ids pack a 41-bit millisecond timestamp (relative to a custom epoch), a
//! 10-bit worker id and a 12-bit per-millisecond sequence. The top bit is
//! always zero, so every id is a non-negative `i64`.

mod clock;
pub mod error;
mod snowflake;
mod snowflake_id;

pub use clock::{Clock, SystemClock};
pub use error::Error;
pub use snowflake::{Snowflake, SnowflakeSettings, DEFAULT_EPOCH};
pub use snowflake_id::SnowflakeId;
