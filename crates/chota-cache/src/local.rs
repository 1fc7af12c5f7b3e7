use chota_core::{Fingerprint, ShortUrlRecord};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Default)]
struct Indices {
    by_short_code: HashMap<String, ShortUrlRecord>,
    by_fingerprint: HashMap<Fingerprint, ShortUrlRecord>,
}

/// The in-process cache tier.
///
/// Keeps every record it is given under both its short code and its
/// long-URL fingerprint. Both indices sit behind a single lock, so a reader
/// never observes a record under one key but not the other. Lookups never
/// await and never leave the process. Entries are never evicted.
#[derive(Debug, Default)]
pub struct LocalUrlCache {
    indices: RwLock<Indices>,
}

impl LocalUrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_by_short_code(&self, code: &str) -> Option<ShortUrlRecord> {
        self.indices.read().by_short_code.get(code).cloned()
    }

    pub fn get_by_fingerprint(&self, fingerprint: &Fingerprint) -> Option<ShortUrlRecord> {
        self.indices.read().by_fingerprint.get(fingerprint).cloned()
    }

    /// Inserts `record` under both of its keys, replacing older copies.
    pub fn put(&self, record: &ShortUrlRecord) {
        trace!(code = %record.short_code, "Storing record in local cache");
        let mut indices = self.indices.write();
        indices
            .by_short_code
            .insert(record.short_code.clone(), record.clone());
        indices
            .by_fingerprint
            .insert(record.long_url_fingerprint.clone(), record.clone());
    }

    /// Number of cached records, counted by short code.
    pub fn len(&self) -> usize {
        self.indices.read().by_short_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut indices = self.indices.write();
        indices.by_short_code.clear();
        indices.by_fingerprint.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;
    use std::sync::Arc;

    fn record(id: i64, url: &str) -> ShortUrlRecord {
        ShortUrlRecord::new(id, url, Timestamp::UNIX_EPOCH).unwrap()
    }

    #[test]
    fn put_makes_record_visible_under_both_keys() {
        let cache = LocalUrlCache::new();
        let record = record(123_456_789, "https://example.com");

        cache.put(&record);

        assert_eq!(cache.get_by_short_code("8m0Kx"), Some(record.clone()));
        assert_eq!(
            cache.get_by_fingerprint(&record.long_url_fingerprint),
            Some(record)
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn misses_return_none() {
        let cache = LocalUrlCache::new();
        assert!(cache.get_by_short_code("nope").is_none());
        assert!(cache
            .get_by_fingerprint(&Fingerprint::of("https://example.com"))
            .is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn put_replaces_previous_copy() {
        let cache = LocalUrlCache::new();
        let mut record = record(1, "https://example.com");
        cache.put(&record);

        record.browser_click_count = 5;
        cache.put(&record);

        let cached = cache.get_by_short_code(&record.short_code).unwrap();
        assert_eq!(cached.browser_click_count, 5);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_both_indices() {
        let cache = LocalUrlCache::new();
        let record = record(1, "https://example.com");
        cache.put(&record);

        cache.clear();

        assert!(cache.get_by_short_code(&record.short_code).is_none());
        assert!(cache
            .get_by_fingerprint(&record.long_url_fingerprint)
            .is_none());
    }

    #[test]
    fn readers_never_see_half_inserted_records() {
        let cache = Arc::new(LocalUrlCache::new());
        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for id in 0..2_000 {
                    cache.put(&record(id, &format!("https://example.com/{id}")));
                }
            })
        };

        let reader = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for id in 0..2_000 {
                    let url = format!("https://example.com/{id}");
                    let expected = record(id, &url);
                    if let Some(found) = cache.get_by_short_code(&expected.short_code) {
                        // Once visible by code, the fingerprint index must agree.
                        assert_eq!(
                            cache.get_by_fingerprint(&found.long_url_fingerprint),
                            Some(found)
                        );
                    }
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(cache.len(), 2_000);
    }
}
