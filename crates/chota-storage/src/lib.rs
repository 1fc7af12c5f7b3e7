//! Durable storage for short URL records and the tiered coordinator that
//! fronts it with the local and distributed caches.

pub mod memory;
pub mod mysql;
pub mod tiered;

pub use chota_core::repository::Result;
pub use chota_core::{DurableRepository, Repository, StorageError};
pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
pub use tiered::TieredRepository;
