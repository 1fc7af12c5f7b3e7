use async_trait::async_trait;
use chota_cache::{
    CacheStatistics, DistributedCacheOptions, DistributedUrlCache, KeyValueCache, LocalUrlCache,
};
use chota_core::repository::{DurableRepository, Repository, Result};
use chota_core::{Fingerprint, ShortUrlRecord, StorageError};
use tracing::{debug, trace, warn};

/// The composite repository in front of the durable store.
///
/// Reads go local cache, then distributed cache, then durable store, and
/// every lower-tier hit is copied into the tiers above it on the way back.
/// Writes go to the durable store first and are cached only once it has
/// accepted them. Nothing is ever invalidated: counter updates write
/// through to the durable store and then replace the local copy, while the
/// distributed copy keeps the counters it was cached with.
///
/// Distributed cache failures are absorbed by [`DistributedUrlCache`];
/// durable store failures propagate.
#[derive(Debug)]
pub struct TieredRepository<R, K> {
    local: LocalUrlCache,
    distributed: DistributedUrlCache<K>,
    durable: R,
}

impl<R: DurableRepository, K: KeyValueCache> TieredRepository<R, K> {
    pub fn new(durable: R, client: K, options: DistributedCacheOptions) -> Self {
        Self::from_parts(LocalUrlCache::new(), DistributedUrlCache::new(client, options), durable)
    }

    pub fn from_parts(local: LocalUrlCache, distributed: DistributedUrlCache<K>, durable: R) -> Self {
        Self {
            local,
            distributed,
            durable,
        }
    }

    pub fn local(&self) -> &LocalUrlCache {
        &self.local
    }

    pub fn distributed(&self) -> &DistributedUrlCache<K> {
        &self.distributed
    }

    pub fn durable(&self) -> &R {
        &self.durable
    }

    /// Statistics of the distributed cache tier.
    pub fn cache_statistics(&self) -> CacheStatistics {
        self.distributed.statistics()
    }

    /// Saves `record` and returns the record the durable store kept for its
    /// fingerprint, after caching it in both cache tiers.
    ///
    /// When another writer won the race for the same fingerprint, the
    /// winner's record is read back and cached instead of `record`.
    pub async fn save_record(&self, record: &ShortUrlRecord) -> Result<ShortUrlRecord> {
        trace!(code = %record.short_code, "Saving record to durable store");
        let stored_id = self.durable.save(record).await?;

        let authoritative = if stored_id == record.id {
            record.clone()
        } else {
            warn!(
                code = %record.short_code,
                id = record.id,
                stored_id,
                "Concurrent save detected, using the stored record"
            );
            self.durable
                .get_by_fingerprint(&record.long_url_fingerprint)
                .await?
                .filter(|stored| stored.id == stored_id)
                .ok_or_else(|| {
                    StorageError::Conflict(format!(
                        "durable store kept id {stored_id} for '{}' but it cannot be read back",
                        record.long_url_fingerprint
                    ))
                })?
        };

        self.distributed.set(&authoritative, None).await;
        self.local.put(&authoritative);
        debug!(code = %authoritative.short_code, "Record saved and cached");

        Ok(authoritative)
    }

    /// Copies a durable-store hit into both cache tiers.
    async fn populate(&self, record: &ShortUrlRecord) {
        self.distributed.set(record, None).await;
        self.local.put(record);
    }
}

#[async_trait]
impl<R: DurableRepository, K: KeyValueCache> Repository for TieredRepository<R, K> {
    async fn get_by_short_code(&self, code: &str) -> Result<Option<ShortUrlRecord>> {
        if let Some(record) = self.local.get_by_short_code(code) {
            trace!(code, "Local cache hit");
            return Ok(Some(record));
        }

        if let Some(record) = self.distributed.get_by_short_code(code).await {
            debug!(code, "Distributed cache hit, populating local cache");
            self.local.put(&record);
            return Ok(Some(record));
        }

        match self.durable.get_by_short_code(code).await? {
            Some(record) => {
                debug!(code, "Durable store hit, populating caches");
                self.populate(&record).await;
                Ok(Some(record))
            }
            None => {
                trace!(code, "Short code not found in any tier");
                Ok(None)
            }
        }
    }

    async fn get_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<ShortUrlRecord>> {
        if let Some(record) = self.local.get_by_fingerprint(fingerprint) {
            trace!(fingerprint = %fingerprint, "Local cache hit");
            return Ok(Some(record));
        }

        if let Some(record) = self.distributed.get_by_fingerprint(fingerprint).await {
            debug!(fingerprint = %fingerprint, "Distributed cache hit, populating local cache");
            self.local.put(&record);
            return Ok(Some(record));
        }

        match self.durable.get_by_fingerprint(fingerprint).await? {
            Some(record) => {
                debug!(fingerprint = %fingerprint, "Durable store hit, populating caches");
                self.populate(&record).await;
                Ok(Some(record))
            }
            None => {
                trace!(fingerprint = %fingerprint, "Fingerprint not found in any tier");
                Ok(None)
            }
        }
    }

    async fn save(&self, record: &ShortUrlRecord) -> Result<i64> {
        self.save_record(record).await.map(|stored| stored.id)
    }

    async fn update_counters(&self, record: &ShortUrlRecord) -> Result<()> {
        trace!(code = %record.short_code, "Writing click counters through to durable store");
        self.durable.update_counters(record).await?;
        // The next resolution increments from the counters just written.
        self.local.put(record);
        Ok(())
    }
}
