use crate::error::StorageError;
use crate::fingerprint::Fingerprint;
use crate::record::ShortUrlRecord;
use async_trait::async_trait;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Lookup and write access to short URL records.
///
/// Implemented by the durable stores and by the tiered coordinator that
/// fronts them with caches, so the shortening workflow can run against
/// either.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Retrieves the record for a short code.
    /// Returns `None` if the code does not exist.
    async fn get_by_short_code(&self, code: &str) -> Result<Option<ShortUrlRecord>>;

    /// Retrieves the record whose long URL has the given fingerprint.
    /// Returns `None` if no such record exists.
    async fn get_by_fingerprint(&self, fingerprint: &Fingerprint)
        -> Result<Option<ShortUrlRecord>>;

    /// Persists a new record and returns the id of the record that is stored
    /// for its fingerprint.
    ///
    /// If another writer stored a record with the same fingerprint first, the
    /// existing record's id is returned instead of an error.
    async fn save(&self, record: &ShortUrlRecord) -> Result<i64>;

    /// Writes the click counters of an existing record.
    async fn update_counters(&self, record: &ShortUrlRecord) -> Result<()>;
}

/// The authoritative store, with the extra read surface only it can answer.
#[async_trait]
pub trait DurableRepository: Repository {
    /// Checks whether a record with the given id exists.
    async fn exists_by_id(&self, id: i64) -> Result<bool>;

    /// Returns the number of stored records.
    async fn count(&self) -> Result<u64>;

    /// Returns up to `limit` records, newest first by creation time.
    async fn recent(&self, limit: usize) -> Result<Vec<ShortUrlRecord>>;
}
