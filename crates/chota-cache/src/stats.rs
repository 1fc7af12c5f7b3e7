use jiff::Timestamp;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free hit/miss/error counters for a cache tier.
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

impl CacheCounters {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time snapshot of the counters.
    pub fn snapshot(&self) -> CacheStatistics {
        CacheStatistics::new(
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.errors.load(Ordering::Relaxed),
            Timestamp::now(),
        )
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }
}

/// A snapshot of cache effectiveness.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    /// `hits / (hits + misses) * 100`, or `0.0` before any lookup.
    pub hit_ratio: f64,
    pub captured_at: Timestamp,
}

impl CacheStatistics {
    pub fn new(hits: u64, misses: u64, errors: u64, captured_at: Timestamp) -> Self {
        let lookups = hits + misses;
        let hit_ratio = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64 * 100.0
        };
        Self {
            hits,
            misses,
            errors,
            hit_ratio,
            captured_at,
        }
    }
}
