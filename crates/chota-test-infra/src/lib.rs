//! Disposable MySQL and Redis containers for integration tests.
//!
//! Everything here needs a reachable Docker daemon.

pub mod error;
pub mod mysql;
pub mod redis;

pub use error::{Result, TestInfraError};
pub use mysql::{MySqlServer, MysqlConfig};
pub use crate::redis::RedisServer;
