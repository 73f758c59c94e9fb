use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::InventoryResult;
use crate::inventory::model::{InventoryItem, ItemKey, NewItem};
use crate::inventory::store::{InventoryStore, ScanRequest};

/// Process-local store.
///
/// Intended for tests and local runs. Writers take the lock exclusively, so two
/// upserts of the same key apply one after the other and the later one wins.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<ItemKey, InventoryItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn upsert(&self, item: NewItem, at: DateTime<Utc>) -> InventoryResult<InventoryItem> {
        let mut records = self
            .records
            .write()
            .map_err(|_| anyhow!("inventory lock poisoned"))?;

        let record = records
            .entry(item.key())
            .and_modify(|existing| {
                existing.price = item.price();
                existing.last_updated_dt = at;
            })
            .or_insert_with(|| InventoryItem {
                id: Uuid::new_v4(),
                name: item.name().to_string(),
                category: item.category(),
                price: item.price(),
                last_updated_dt: at,
            });
        debug!("Upserted {} of {} in memory", record.name, record.category);
        Ok(record.clone())
    }

    async fn delete(&self, key: &ItemKey) -> InventoryResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| anyhow!("inventory lock poisoned"))?;
        records.remove(key);
        Ok(())
    }

    async fn find(&self, request: &ScanRequest) -> InventoryResult<Vec<InventoryItem>> {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("inventory lock poisoned"))?;

        Ok(records
            .values()
            .filter(|r| request.category.map_or(true, |c| c == r.category))
            .filter(|r| request.price_range.map_or(true, |p| p.contains(r.price)))
            .filter(|r| {
                request
                    .updated_between
                    .map_or(true, |(from, to)| from <= r.last_updated_dt && r.last_updated_dt <= to)
            })
            .cloned()
            .collect())
    }
}
