use async_trait::async_trait;
use chota_core::repository::{DurableRepository, Repository, Result};
use chota_core::{Fingerprint, ShortUrlRecord, StorageError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// In-memory implementation of the durable repository using DashMap.
///
/// Records are keyed by id, with secondary indices from short code and
/// fingerprint to id. `save` claims the fingerprint slot through the entry
/// API, so two concurrent saves of the same URL resolve exactly like a
/// unique-key violation in a relational store: one row wins and the loser
/// gets the winner's id.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    records: DashMap<i64, ShortUrlRecord>,
    by_short_code: DashMap<String, i64>,
    by_fingerprint: DashMap<Fingerprint, i64>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn record_by_id(&self, id: i64) -> Option<ShortUrlRecord> {
        self.records.get(&id).map(|record| record.clone())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_by_short_code(&self, code: &str) -> Result<Option<ShortUrlRecord>> {
        let id = self.by_short_code.get(code).map(|id| *id);
        Ok(id.and_then(|id| self.record_by_id(id)))
    }

    async fn get_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<ShortUrlRecord>> {
        let id = self.by_fingerprint.get(fingerprint).map(|id| *id);
        Ok(id.and_then(|id| self.record_by_id(id)))
    }

    async fn save(&self, record: &ShortUrlRecord) -> Result<i64> {
        // Lock order: fingerprint, then short code, then records.
        let fingerprint_slot = match self.by_fingerprint.entry(record.long_url_fingerprint.clone()) {
            Entry::Occupied(existing) => return Ok(*existing.get()),
            Entry::Vacant(slot) => slot,
        };

        let code_slot = match self.by_short_code.entry(record.short_code.clone()) {
            Entry::Occupied(existing) => return Ok(*existing.get()),
            Entry::Vacant(slot) => slot,
        };

        match self.records.entry(record.id) {
            Entry::Occupied(_) => {
                return Err(StorageError::Conflict(format!(
                    "id {} is already taken by another record",
                    record.id
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
            }
        }

        code_slot.insert(record.id);
        fingerprint_slot.insert(record.id);
        Ok(record.id)
    }

    async fn update_counters(&self, record: &ShortUrlRecord) -> Result<()> {
        if let Some(mut stored) = self.records.get_mut(&record.id) {
            stored.browser_click_count = record.browser_click_count;
            stored.api_click_count = record.api_click_count;
        }
        Ok(())
    }
}

#[async_trait]
impl DurableRepository for InMemoryRepository {
    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        Ok(self.records.contains_key(&id))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.len() as u64)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ShortUrlRecord>> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        records.truncate(limit);
        Ok(records)
    }
}
