//! Cache tiers that sit in front of the durable URL store.
//!
//! [`LocalUrlCache`] is the in-process tier. [`DistributedUrlCache`] wraps
//! any [`KeyValueCache`] client (Redis in production, an in-memory map for
//! tests and single-node runs) and never surfaces client failures to callers.

pub mod distributed;
pub mod error;
pub mod kv;
pub mod local;
pub mod memory;
pub mod redis;
pub mod stats;

pub use distributed::{DistributedCacheOptions, DistributedUrlCache};
pub use error::{CacheError, Result};
pub use kv::{EntryOptions, KeyValueCache};
pub use local::LocalUrlCache;
pub use memory::MemoryKeyValueCache;
pub use crate::redis::RedisKeyValueCache;
pub use stats::{CacheCounters, CacheStatistics};
