use chota_core::{Fingerprint, ShortUrlRecord};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, trace, warn};
use typed_builder::TypedBuilder;

use crate::error::{CacheError, Result};
use crate::kv::{EntryOptions, KeyValueCache};
use crate::stats::{CacheCounters, CacheStatistics};

pub const DEFAULT_NAMESPACE: &str = "urlshort";
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_SLIDING_EXPIRATION: Duration = Duration::from_secs(6 * 60 * 60);

/// Configuration for the [`DistributedUrlCache`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct DistributedCacheOptions {
    /// Prefix shared by every key this cache writes.
    #[builder(default = DEFAULT_NAMESPACE.to_string(), setter(into))]
    pub namespace: String,
    /// Absolute expiration used when `set` is given no explicit expiration.
    #[builder(default = DEFAULT_EXPIRATION)]
    pub default_expiration: Duration,
    /// Sliding expiration used when `set` is given no explicit expiration.
    #[builder(default = DEFAULT_SLIDING_EXPIRATION)]
    pub sliding_expiration: Duration,
    /// Upper bound on each client call. A call that exceeds it counts as an error.
    #[builder(default, setter(strip_option))]
    pub operation_timeout: Option<Duration>,
}

impl Default for DistributedCacheOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The distributed cache tier.
///
/// Stores serialized [`ShortUrlRecord`]s in a [`KeyValueCache`] under two
/// keys, `{namespace}:sc:{short_code}` and `{namespace}:lu:{fingerprint}`.
///
/// Nothing here returns an error. Client, timeout and serialization failures
/// are logged and counted, then reported as a miss (reads) or dropped
/// (writes), so callers always fall through to the next tier.
#[derive(Debug)]
pub struct DistributedUrlCache<K> {
    client: K,
    options: DistributedCacheOptions,
    counters: CacheCounters,
}

impl<K: KeyValueCache> DistributedUrlCache<K> {
    pub fn new(client: K, options: DistributedCacheOptions) -> Self {
        Self {
            client,
            options,
            counters: CacheCounters::default(),
        }
    }

    pub fn client(&self) -> &K {
        &self.client
    }

    pub fn options(&self) -> &DistributedCacheOptions {
        &self.options
    }

    pub fn short_code_key(&self, code: &str) -> String {
        format!("{}:sc:{}", self.options.namespace, code)
    }

    pub fn fingerprint_key(&self, fingerprint: &Fingerprint) -> String {
        format!("{}:lu:{}", self.options.namespace, fingerprint)
    }

    pub async fn get_by_short_code(&self, code: &str) -> Option<ShortUrlRecord> {
        if code.trim().is_empty() {
            warn!("Ignoring distributed cache lookup with a blank short code");
            return None;
        }
        self.lookup(self.short_code_key(code)).await
    }

    pub async fn get_by_fingerprint(&self, fingerprint: &Fingerprint) -> Option<ShortUrlRecord> {
        if fingerprint.as_str().trim().is_empty() {
            warn!("Ignoring distributed cache lookup with a blank fingerprint");
            return None;
        }
        self.lookup(self.fingerprint_key(fingerprint)).await
    }

    /// Writes `record` under both of its keys.
    ///
    /// With an explicit `expiration` the entries expire that long after the
    /// write. Otherwise the configured default absolute and sliding
    /// expirations apply.
    pub async fn set(&self, record: &ShortUrlRecord, expiration: Option<Duration>) {
        if record.short_code.trim().is_empty() || record.long_url.trim().is_empty() {
            warn!(id = record.id, "Refusing to cache a record without short code or long URL");
            return;
        }

        let value = match serde_json::to_string(record) {
            Ok(value) => value,
            Err(e) => {
                self.counters.record_error();
                error!(code = %record.short_code, error = %e, "Failed to serialize record for caching");
                return;
            }
        };

        let options = match expiration {
            Some(ttl) => EntryOptions::absolute(ttl),
            None => EntryOptions::sliding(
                self.options.default_expiration,
                self.options.sliding_expiration,
            ),
        };

        let code_key = self.short_code_key(&record.short_code);
        let fingerprint_key = self.fingerprint_key(&record.long_url_fingerprint);
        let (by_code, by_fingerprint) = tokio::join!(
            self.call(self.client.set(&code_key, value.clone(), options)),
            self.call(self.client.set(&fingerprint_key, value, options)),
        );

        for (key, outcome) in [(code_key, by_code), (fingerprint_key, by_fingerprint)] {
            match outcome {
                Ok(()) => debug!(key = %key, "Stored record in distributed cache"),
                Err(e) => {
                    self.counters.record_error();
                    error!(key = %key, error = %e, "Failed to store record in distributed cache");
                }
            }
        }
    }

    /// Checks whether `key` is present. Failures read as absent.
    pub async fn exists(&self, key: &str) -> bool {
        match self.call(self.client.exists(key)).await {
            Ok(found) => found,
            Err(e) => {
                self.counters.record_error();
                warn!(key, error = %e, "Distributed cache exists check failed");
                false
            }
        }
    }

    pub async fn remove_by_short_code(&self, code: &str) {
        self.remove_key(self.short_code_key(code)).await;
    }

    pub async fn remove_by_fingerprint(&self, fingerprint: &Fingerprint) {
        self.remove_key(self.fingerprint_key(fingerprint)).await;
    }

    /// Removes both keys of `record`.
    pub async fn remove(&self, record: &ShortUrlRecord) {
        tokio::join!(
            self.remove_by_short_code(&record.short_code),
            self.remove_by_fingerprint(&record.long_url_fingerprint),
        );
    }

    pub fn statistics(&self) -> CacheStatistics {
        self.counters.snapshot()
    }

    pub fn reset_statistics(&self) {
        self.counters.reset();
    }

    async fn lookup(&self, key: String) -> Option<ShortUrlRecord> {
        trace!(key = %key, "Fetching record from distributed cache");

        let raw = match self.call(self.client.get(&key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.counters.record_miss();
                trace!(key = %key, "Distributed cache miss");
                return None;
            }
            Err(e) => {
                self.counters.record_error();
                warn!(key = %key, error = %e, "Distributed cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<ShortUrlRecord>(&raw) {
            Ok(record) => {
                self.counters.record_hit();
                debug!(key = %key, "Distributed cache hit");
                Some(record)
            }
            Err(e) => {
                self.counters.record_error();
                warn!(key = %key, error = %e, "Failed to deserialize cached record, treating as miss");
                None
            }
        }
    }

    async fn remove_key(&self, key: String) {
        match self.call(self.client.remove(&key)).await {
            Ok(()) => debug!(key = %key, "Removed record from distributed cache"),
            Err(e) => {
                self.counters.record_error();
                warn!(key = %key, error = %e, "Failed to remove record from distributed cache");
            }
        }
    }

    async fn call<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        match self.options.operation_timeout {
            Some(limit) => tokio::time::timeout(limit, operation)
                .await
                .map_err(|_| CacheError::Timeout(format!("no response within {limit:?}")))?,
            None => operation.await,
        }
    }
}
