//! Inventory records and the query engine over them.
//!
//! Requests flow through [`InventoryEngine`], which asks an
//! [`InventoryStore`] for candidate records and then applies the
//! filter, sort, paginate and aggregate steps itself.

pub mod aggregate;
pub mod engine;
pub mod model;
pub mod query;
pub mod store;

pub use aggregate::{AggregateScope, DateRange};
pub use engine::InventoryEngine;
pub use model::{Category, InventoryItem, ItemKey, NewItem};
pub use query::{Filters, Pagination, PriceRange, Query, Sort, SortField, SortOrder};
pub use store::{DynamoStore, InventoryStore, MemoryStore};
