use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Expiration policy for a single cache entry.
///
/// An entry with an absolute expiration disappears once that much time has
/// passed since it was written. An entry with a sliding expiration
/// disappears once it has gone unread for that long; every read pushes the
/// deadline out again, but never past the absolute expiration. An entry with
/// neither never expires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryOptions {
    pub absolute_expiration: Option<Duration>,
    pub sliding_expiration: Option<Duration>,
}

impl EntryOptions {
    /// Expire exactly `ttl` after the write, regardless of reads.
    pub fn absolute(ttl: Duration) -> Self {
        Self {
            absolute_expiration: Some(ttl),
            sliding_expiration: None,
        }
    }

    /// Expire after `absolute` at the latest, or earlier after `sliding` without a read.
    pub fn sliding(absolute: Duration, sliding: Duration) -> Self {
        Self {
            absolute_expiration: Some(absolute),
            sliding_expiration: Some(sliding),
        }
    }

    /// Time to live right after a write or read, before any absolute cap.
    pub(crate) fn initial_ttl(&self) -> Option<Duration> {
        match (self.absolute_expiration, self.sliding_expiration) {
            (Some(absolute), Some(sliding)) => Some(absolute.min(sliding)),
            (absolute, sliding) => absolute.or(sliding),
        }
    }
}

/// A string key-value store with per-entry expiration.
///
/// This is the client contract the distributed cache tier is built on.
/// Implementations report their own failures; deciding what a failure means
/// for a lookup is left to the caller.
#[async_trait]
pub trait KeyValueCache: Send + Sync + 'static {
    /// Returns the value stored under `key`, refreshing its sliding expiration.
    ///
    /// Returns `Ok(None)` if the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String, options: EntryOptions) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Checks whether `key` is present without refreshing it.
    async fn exists(&self, key: &str) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_ttl_takes_the_shorter_window() {
        let options = EntryOptions::sliding(Duration::from_secs(60), Duration::from_secs(10));
        assert_eq!(options.initial_ttl(), Some(Duration::from_secs(10)));

        let options = EntryOptions::sliding(Duration::from_secs(5), Duration::from_secs(10));
        assert_eq!(options.initial_ttl(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn initial_ttl_of_single_policies() {
        assert_eq!(
            EntryOptions::absolute(Duration::from_secs(3)).initial_ttl(),
            Some(Duration::from_secs(3))
        );
        assert_eq!(EntryOptions::default().initial_ttl(), None);
    }
}
