//! Core types and traits for the Chota URL shortener.
//!
//! This crate provides the domain record, the deterministic long-URL
//! fingerprint, the base-62 short code codec and the repository contracts
//! shared by the storage tiers and the shortening workflow.

pub mod base62;
pub mod error;
pub mod fingerprint;
pub mod record;
pub mod repository;

pub use error::{CoreError, StorageError};
pub use fingerprint::{fingerprint, Fingerprint};
pub use record::ShortUrlRecord;
pub use repository::{DurableRepository, Repository};
