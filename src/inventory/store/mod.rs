//! Storage backends for inventory records.
//!
//! Stores only persist and fetch. All filtering, ordering and grouping is done
//! by the engine on whatever a store returns, so a store is free to return a
//! superset of what a [`ScanRequest`] asks for.

mod dynamo;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::InventoryResult;
use crate::inventory::model::{Category, InventoryItem, ItemKey, NewItem};
use crate::inventory::query::PriceRange;

pub use dynamo::DynamoStore;
pub use memory::MemoryStore;

/// Narrowing hints passed down to a store read.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScanRequest {
    pub category: Option<Category>,
    pub price_range: Option<PriceRange>,
    pub updated_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl ScanRequest {
    pub fn all() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Inserts the item, or overwrites price and timestamp of the record with
    /// the same key. The record id survives overwrites.
    async fn upsert(&self, item: NewItem, at: DateTime<Utc>) -> InventoryResult<InventoryItem>;

    /// Removes the record with `key`. Missing records are not an error.
    async fn delete(&self, key: &ItemKey) -> InventoryResult<()>;

    async fn find(&self, request: &ScanRequest) -> InventoryResult<Vec<InventoryItem>>;
}
