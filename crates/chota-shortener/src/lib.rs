//! The shortening workflow.
//!
//! [`ShortenerService`] turns long URLs into short URL records and resolves
//! short codes back, against any [`Repository`](chota_core::Repository),
//! normally the tiered coordinator from `chota-storage`. [`ClickTracker`]
//! records resolutions in the background.

pub mod click;
pub mod error;
pub mod service;
pub mod validator;

pub use click::{ClickSource, ClickTracker};
pub use error::{ErrorKind, ShortenerError};
pub use service::ShortenerService;
pub use validator::{UrlDefect, UrlValidator};
