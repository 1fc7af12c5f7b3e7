use crate::click::ClickTracker;
use crate::error::{Result, ShortenerError};
use crate::validator::UrlValidator;
use chota_core::{fingerprint, Repository, ShortUrlRecord};
use chota_generator::IdGenerator;
use jiff::Timestamp;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// The shortening workflow.
///
/// Wraps a [`Repository`] (normally the tiered coordinator) and an
/// [`IdGenerator`]. Shortening is idempotent per normalized long URL:
/// submitting the same URL twice, or from two callers at once, yields the
/// same record.
#[derive(Debug)]
pub struct ShortenerService<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
}

impl<R, G> Clone for ShortenerService<R, G> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            generator: Arc::clone(&self.generator),
        }
    }
}

impl<R: Repository, G: IdGenerator> ShortenerService<R, G> {
    pub fn new(repository: R, generator: G) -> Self {
        Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// A tracker that persists click counters through this service's repository.
    pub fn click_tracker(&self) -> ClickTracker<R> {
        ClickTracker::new(Arc::clone(&self.repository))
    }

    /// Returns the record for `long_url`, creating it if it does not exist yet.
    pub async fn shorten(&self, long_url: &str) -> Result<ShortUrlRecord> {
        let long_url = long_url.trim();
        if long_url.is_empty() {
            return Err(ShortenerError::Validation(
                "long URL cannot be empty".to_string(),
            ));
        }

        if let Err(defect) = UrlValidator::validate(long_url) {
            debug!(%defect, "Rejected long URL");
            return Err(ShortenerError::Validation(format!(
                "invalid URL format: {defect}"
            )));
        }

        let fingerprint = fingerprint(long_url);
        if let Some(existing) = self.repository.get_by_fingerprint(&fingerprint).await? {
            trace!(code = %existing.short_code, "Long URL already shortened");
            return Ok(existing);
        }

        let id = self.generator.next_id()?;
        let record = ShortUrlRecord::new(id, long_url, now())?;
        let stored_id = self.repository.save(&record).await?;

        if stored_id == record.id {
            info!(code = %record.short_code, id, "Created short URL");
            return Ok(record);
        }

        warn!(
            code = %record.short_code,
            id,
            stored_id,
            "Another request shortened the same URL first"
        );
        self.repository
            .get_by_fingerprint(&fingerprint)
            .await?
            .ok_or_else(|| {
                ShortenerError::Conflict("the short URL could not be created, retry".to_string())
            })
    }

    /// Looks up the record behind `code`.
    ///
    /// The returned record is owned by the caller, which may bump its click
    /// counters (see [`ClickTracker`]).
    pub async fn resolve_short_code(&self, code: &str) -> Result<ShortUrlRecord> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ShortenerError::Validation(
                "short code cannot be empty".to_string(),
            ));
        }

        self.repository
            .get_by_short_code(code)
            .await?
            .ok_or_else(|| ShortenerError::NotFound("short URL not found".to_string()))
    }
}

/// Current time at the microsecond precision the durable store keeps, so a
/// freshly created record compares equal to its stored copy.
fn now() -> Timestamp {
    let now = Timestamp::now();
    Timestamp::from_microsecond(now.as_microsecond()).unwrap_or(now)
}
