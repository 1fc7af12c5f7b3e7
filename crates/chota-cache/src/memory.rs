use crate::error::Result;
use crate::kv::{EntryOptions, KeyValueCache};
use async_trait::async_trait;
use dashmap::DashMap;
use jiff::{SignedDuration, Timestamp};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

type NowFn = Arc<dyn Fn() -> Timestamp + Send + Sync>;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    absolute_deadline: Option<Timestamp>,
    sliding_expiration: Option<Duration>,
    last_access: Timestamp,
}

impl MemoryEntry {
    fn is_expired(&self, now: Timestamp) -> bool {
        let past_absolute = self.absolute_deadline.is_some_and(|deadline| now >= deadline);
        let past_sliding = self
            .sliding_expiration
            .and_then(|window| deadline(self.last_access, window))
            .is_some_and(|deadline| now >= deadline);
        past_absolute || past_sliding
    }
}

/// `None` means the deadline lies beyond what a timestamp can represent.
fn deadline(from: Timestamp, ttl: Duration) -> Option<Timestamp> {
    SignedDuration::try_from(ttl)
        .ok()
        .and_then(|ttl| from.checked_add(ttl).ok())
}

/// An in-process [`KeyValueCache`] backed by a [`DashMap`].
///
/// Honours the same absolute and sliding expiration rules as the Redis
/// client. Expired entries are dropped lazily when they are next touched.
#[derive(Clone)]
pub struct MemoryKeyValueCache {
    entries: Arc<DashMap<String, MemoryEntry>>,
    now: NowFn,
}

impl MemoryKeyValueCache {
    pub fn new() -> Self {
        Self::with_time_source(Timestamp::now)
    }

    /// Creates a cache that reads the current time from `now`.
    pub fn with_time_source(now: impl Fn() -> Timestamp + Send + Sync + 'static) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            now: Arc::new(now),
        }
    }

    /// Number of stored entries, including expired ones not yet dropped.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn live_entry(&self, key: &str, now: Timestamp, touch: bool) -> Option<String> {
        let value = {
            let mut entry = self.entries.get_mut(key)?;
            if entry.is_expired(now) {
                None
            } else {
                if touch {
                    entry.last_access = now;
                }
                Some(entry.value.clone())
            }
        };

        if value.is_none() {
            trace!(key, "Dropping expired entry");
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }
        value
    }
}

impl Default for MemoryKeyValueCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryKeyValueCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryKeyValueCache")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl KeyValueCache for MemoryKeyValueCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = (self.now)();
        Ok(self.live_entry(key, now, true))
    }

    async fn set(&self, key: &str, value: String, options: EntryOptions) -> Result<()> {
        let now = (self.now)();
        let entry = MemoryEntry {
            value,
            absolute_deadline: options
                .absolute_expiration
                .and_then(|ttl| deadline(now, ttl)),
            sliding_expiration: options.sliding_expiration,
            last_access: now,
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let now = (self.now)();
        Ok(self.live_entry(key, now, false).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn at(seconds: i64) -> Timestamp {
        Timestamp::from_second(seconds).unwrap()
    }

    fn cache_with_clock() -> (MemoryKeyValueCache, Arc<Mutex<Timestamp>>) {
        let clock = Arc::new(Mutex::new(at(1_000)));
        let cache = MemoryKeyValueCache::with_time_source({
            let clock = Arc::clone(&clock);
            move || *clock.lock()
        });
        (cache, clock)
    }

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let cache = MemoryKeyValueCache::new();
        cache
            .set("k", "v".to_string(), EntryOptions::default())
            .await
            .unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
        assert!(cache.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn remove_deletes_entry() {
        let cache = MemoryKeyValueCache::new();
        cache
            .set("k", "v".to_string(), EntryOptions::default())
            .await
            .unwrap();
        cache.remove("k").await.unwrap();
        cache.remove("missing").await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn absolute_expiration_is_not_extended_by_reads() {
        let (cache, clock) = cache_with_clock();
        cache
            .set("k", "v".to_string(), EntryOptions::absolute(Duration::from_secs(10)))
            .await
            .unwrap();

        *clock.lock() = at(1_009);
        assert!(cache.get("k").await.unwrap().is_some());

        *clock.lock() = at(1_010);
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn sliding_expiration_refreshes_on_read() {
        let (cache, clock) = cache_with_clock();
        let options = EntryOptions::sliding(Duration::from_secs(100), Duration::from_secs(10));
        cache.set("k", "v".to_string(), options).await.unwrap();

        // Each read inside the window pushes the deadline out.
        for now in [1_008, 1_016, 1_024] {
            *clock.lock() = at(now);
            assert!(cache.get("k").await.unwrap().is_some(), "expired at {now}");
        }

        *clock.lock() = at(1_034);
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn absolute_expiration_caps_sliding_refresh() {
        let (cache, clock) = cache_with_clock();
        let options = EntryOptions::sliding(Duration::from_secs(15), Duration::from_secs(10));
        cache.set("k", "v".to_string(), options).await.unwrap();

        *clock.lock() = at(1_009);
        assert!(cache.get("k").await.unwrap().is_some());

        // Still inside the sliding window but past the absolute deadline.
        *clock.lock() = at(1_015);
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn exists_does_not_refresh_sliding_window() {
        let (cache, clock) = cache_with_clock();
        let options = EntryOptions::sliding(Duration::from_secs(100), Duration::from_secs(10));
        cache.set("k", "v".to_string(), options).await.unwrap();

        *clock.lock() = at(1_008);
        assert!(cache.exists("k").await.unwrap());

        *clock.lock() = at(1_010);
        assert!(!cache.exists("k").await.unwrap());
    }
}
