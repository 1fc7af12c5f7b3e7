use async_trait::async_trait;
use chota_core::repository::{DurableRepository, Repository, Result};
use chota_core::{Fingerprint, ShortUrlRecord, StorageError};
use jiff::Timestamp;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::{debug, warn};

const SELECT_COLUMNS: &str = "SELECT id, long_url, short_code, long_url_fingerprint, created_at, \
     browser_click_count, api_click_count FROM short_urls";

/// MySQL implementation of the durable repository.
///
/// One row per record in `short_urls` (see `ddl/mysql/short_urls.sql`).
/// Unique keys on `short_code` and `long_url_fingerprint` make the database
/// the arbiter when two writers shorten the same URL at once. `created_at`
/// is stored as Unix microseconds.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn fetch_one_where(&self, column: &str, value: &str) -> Result<Option<ShortUrlRecord>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE {column} = ? LIMIT 1"))
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(record_from_row).transpose()
    }
}

fn record_from_row(row: &MySqlRow) -> Result<ShortUrlRecord> {
    let created_at_micros: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let created_at = Timestamp::from_microsecond(created_at_micros).map_err(|e| {
        StorageError::InvalidData(format!(
            "invalid created_at timestamp '{created_at_micros}': {e}"
        ))
    })?;
    let fingerprint: String = row
        .try_get("long_url_fingerprint")
        .map_err(map_sqlx_error)?;

    Ok(ShortUrlRecord {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        long_url: row.try_get("long_url").map_err(map_sqlx_error)?,
        short_code: row.try_get("short_code").map_err(map_sqlx_error)?,
        long_url_fingerprint: Fingerprint::from_raw(fingerprint),
        created_at,
        browser_click_count: row
            .try_get("browser_click_count")
            .map_err(map_sqlx_error)?,
        api_click_count: row.try_get("api_click_count").map_err(map_sqlx_error)?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn get_by_short_code(&self, code: &str) -> Result<Option<ShortUrlRecord>> {
        self.fetch_one_where("short_code", code).await
    }

    async fn get_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<ShortUrlRecord>> {
        self.fetch_one_where("long_url_fingerprint", fingerprint.as_str())
            .await
    }

    async fn save(&self, record: &ShortUrlRecord) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO short_urls
                (id, long_url, short_code, long_url_fingerprint, created_at,
                 browser_click_count, api_click_count)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id)
        .bind(&record.long_url)
        .bind(&record.short_code)
        .bind(record.long_url_fingerprint.as_str())
        .bind(record.created_at.as_microsecond())
        .bind(record.browser_click_count)
        .bind(record.api_click_count)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(code = %record.short_code, id = record.id, "Inserted record");
                Ok(record.id)
            }
            Err(err) if is_unique_violation(&err) => {
                warn!(
                    code = %record.short_code,
                    fingerprint = %record.long_url_fingerprint,
                    "Unique violation on insert, resolving to the existing record"
                );
                if let Some(existing) = self.get_by_fingerprint(&record.long_url_fingerprint).await? {
                    return Ok(existing.id);
                }
                if let Some(existing) = self.get_by_short_code(&record.short_code).await? {
                    return Ok(existing.id);
                }
                Err(StorageError::Conflict(format!(
                    "insert of '{}' violated a unique key but no existing row was found",
                    record.short_code
                )))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn update_counters(&self, record: &ShortUrlRecord) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE short_urls
            SET browser_click_count = ?, api_click_count = ?
            WHERE id = ?
            "#,
        )
        .bind(record.browser_click_count)
        .bind(record.api_click_count)
        .bind(record.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}

#[async_trait]
impl DurableRepository for MySqlRepository {
    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        let exists = sqlx::query("SELECT 1 FROM short_urls WHERE id = ? LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .is_some();

        Ok(exists)
    }

    async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM short_urls")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        let total: i64 = row.try_get("total").map_err(map_sqlx_error)?;

        u64::try_from(total)
            .map_err(|_| StorageError::InvalidData(format!("negative row count {total}")))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ShortUrlRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(record_from_row).collect()
    }
}
