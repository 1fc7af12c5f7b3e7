use async_trait::async_trait;
use jiff::Timestamp;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::error::{CacheError, Result};
use crate::kv::{EntryOptions, KeyValueCache};

const DATA_FIELD: &str = "data";
const ABSOLUTE_FIELD: &str = "absexp";
const SLIDING_FIELD: &str = "sldexp";
/// Stored in the expiration fields when the policy is unset.
const NOT_PRESENT: i64 = -1;

/// A Redis-based implementation of [`KeyValueCache`].
///
/// Each entry is a hash with three fields: `data` holds the value, `absexp`
/// the absolute deadline in Unix milliseconds and `sldexp` the sliding window
/// in milliseconds (`-1` when unset). The key itself carries a `PEXPIRE`
/// matching the next deadline; reads of a sliding entry push it out again,
/// capped at the absolute deadline.
#[derive(Clone)]
pub struct RedisKeyValueCache {
    conn: redis::aio::MultiplexedConnection,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_connection_dropped() || err.is_connection_refusal() || err.is_io_error() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// TTL to apply after a read, or `None` when the entry should be left alone.
fn refreshed_ttl_ms(absolute_deadline_ms: i64, sliding_ms: i64, now_ms: i64) -> Option<i64> {
    if sliding_ms == NOT_PRESENT {
        return None;
    }
    let ttl = if absolute_deadline_ms == NOT_PRESENT {
        sliding_ms
    } else {
        sliding_ms.min(absolute_deadline_ms - now_ms)
    };
    (ttl > 0).then_some(ttl)
}

impl RedisKeyValueCache {
    /// Creates a new Redis key-value cache.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self { conn }
    }

    /// Opens a multiplexed connection to `url` and wraps it.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Unavailable(format!("invalid Redis URL '{url}': {e}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;
        Ok(Self::new(conn))
    }
}

impl std::fmt::Debug for RedisKeyValueCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKeyValueCache").finish_non_exhaustive()
    }
}

#[async_trait]
impl KeyValueCache for RedisKeyValueCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        trace!(key, "Fetching value from Redis");

        let mut conn = self.conn.clone();
        let (absolute_ms, sliding_ms, data): (Option<i64>, Option<i64>, Option<String>) =
            redis::cmd("HMGET")
                .arg(key)
                .arg(ABSOLUTE_FIELD)
                .arg(SLIDING_FIELD)
                .arg(DATA_FIELD)
                .query_async(&mut conn)
                .await
                .map_err(|e| map_redis_error("failed to fetch value from Redis", e))?;

        let Some(data) = data else {
            trace!(key, "Key not found in Redis");
            return Ok(None);
        };

        let now_ms = Timestamp::now().as_millisecond();
        if let Some(ttl) = refreshed_ttl_ms(
            absolute_ms.unwrap_or(NOT_PRESENT),
            sliding_ms.unwrap_or(NOT_PRESENT),
            now_ms,
        ) {
            // A failed refresh only shortens the entry's life; the value is still good.
            if let Err(e) = conn.pexpire::<_, ()>(key, ttl).await {
                warn!(key, error = %e, "Failed to refresh sliding expiration");
            }
        }

        Ok(Some(data))
    }

    async fn set(&self, key: &str, value: String, options: EntryOptions) -> Result<()> {
        trace!(key, "Writing value to Redis");

        let now_ms = Timestamp::now().as_millisecond();
        let absolute_ms = options
            .absolute_expiration
            .map(|ttl| now_ms.saturating_add(millis(ttl)))
            .unwrap_or(NOT_PRESENT);
        let sliding_ms = options.sliding_expiration.map(millis).unwrap_or(NOT_PRESENT);

        let mut pipe = redis::pipe();
        pipe.atomic()
            .del(key)
            .ignore()
            .hset_multiple(
                key,
                &[
                    (DATA_FIELD, value),
                    (ABSOLUTE_FIELD, absolute_ms.to_string()),
                    (SLIDING_FIELD, sliding_ms.to_string()),
                ],
            )
            .ignore();
        if let Some(ttl) = options.initial_ttl() {
            pipe.pexpire(key, millis(ttl).max(1)).ignore();
        }

        let mut conn = self.conn.clone();
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(|e| map_redis_error("failed to write value to Redis", e))?;

        debug!(key, "Stored value in Redis");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        trace!(key, "Removing value from Redis");

        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| map_redis_error("failed to delete value from Redis", e))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        conn.exists::<_, bool>(key)
            .await
            .map_err(|e| map_redis_error("failed to check key in Redis", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_uses_sliding_window_when_no_absolute_deadline() {
        assert_eq!(refreshed_ttl_ms(NOT_PRESENT, 6_000, 1_000), Some(6_000));
    }

    #[test]
    fn refresh_is_capped_by_absolute_deadline() {
        assert_eq!(refreshed_ttl_ms(4_000, 6_000, 1_000), Some(3_000));
        assert_eq!(refreshed_ttl_ms(100_000, 6_000, 1_000), Some(6_000));
    }

    #[test]
    fn no_refresh_without_sliding_window_or_past_deadline() {
        assert_eq!(refreshed_ttl_ms(4_000, NOT_PRESENT, 1_000), None);
        assert_eq!(refreshed_ttl_ms(1_000, 6_000, 1_000), None);
    }
}
