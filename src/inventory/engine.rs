use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::error::InventoryResult;
use crate::inventory::aggregate::{
    self, AggregateReport, AggregateScope, DateRange, DateRangeReport,
};
use crate::inventory::model::{InventoryItem, ItemKey, NewItem};
use crate::inventory::query::{Query, QueryPage};
use crate::inventory::store::{InventoryStore, ScanRequest};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Entry point for every inventory operation.
///
/// The engine is cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct InventoryEngine {
    store: Arc<dyn InventoryStore>,
    clock: Clock,
}

impl fmt::Debug for InventoryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InventoryEngine").finish_non_exhaustive()
    }
}

impl InventoryEngine {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            store,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the wall clock used to stamp writes.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Inserts `item` or overwrites the price of the record with the same
    /// name and category. Either way `last_updated_dt` is refreshed.
    #[instrument(skip(self, item), fields(name = item.name(), category = %item.category()))]
    pub async fn upsert(&self, item: NewItem) -> InventoryResult<InventoryItem> {
        let stored = self.store.upsert(item, (self.clock)()).await?;
        info!("Upserted item {}", stored.id);
        Ok(stored)
    }

    /// Removes the record if present. Deleting a missing record succeeds.
    #[instrument(skip(self))]
    pub async fn delete(&self, key: &ItemKey) -> InventoryResult<()> {
        self.store.delete(key).await?;
        info!("Deleted {} of {}", key.name, key.category);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn query(&self, query: &Query) -> InventoryResult<QueryPage> {
        query.validate()?;
        let candidates = self.store.find(&query.pushdown()).await?;
        let page = query.evaluate(candidates)?;
        info!("Query matched {} item(s), returning {}", page.total, page.count);
        Ok(page)
    }

    #[instrument(skip(self))]
    pub async fn filter_by_date_range(&self, range: &DateRange) -> InventoryResult<DateRangeReport> {
        let request = ScanRequest {
            updated_between: Some((range.from(), range.to())),
            ..ScanRequest::all()
        };
        let candidates = self.store.find(&request).await?;
        Ok(aggregate::filter_by_date_range(candidates, range))
    }

    /// Per-category count and price sum. `label` is `"all"` or a category;
    /// anything else matches no records.
    #[instrument(skip(self))]
    pub async fn aggregate(&self, label: &str) -> InventoryResult<AggregateReport> {
        let Some(scope) = AggregateScope::parse(label) else {
            return Ok(AggregateReport::empty());
        };
        let request = match scope {
            AggregateScope::All => ScanRequest::all(),
            AggregateScope::Category(c) => ScanRequest {
                category: Some(c),
                ..ScanRequest::all()
            },
        };
        let records = self.store.find(&request).await?;
        Ok(aggregate::aggregate(&records, scope))
    }
}
