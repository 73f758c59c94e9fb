//! Structured queries over inventory records.
//!
//! A [`Query`] is evaluated in three steps over the candidate set a store
//! returns: filter, sort, paginate. Ordering is total: records equal on the
//! requested sort field fall back to `(name, category)` ascending, so the same
//! query over the same data always yields the same pages.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{InventoryError, InventoryResult};
use crate::inventory::model::{Category, InventoryItem};
use crate::inventory::store::ScanRequest;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// Conjunction of optional predicates. An empty filter set matches everything.
///
/// Blank strings and an empty `price_range` array count as absent, which is
/// how form-driven clients send "any".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    /// Case-insensitive substring of the item name.
    pub name: Option<String>,
    /// Category label; unknown labels match nothing.
    pub category: Option<String>,
    #[serde(deserialize_with = "price_range_or_empty")]
    pub price_range: Option<PriceRange>,
}

fn price_range_or_empty<'de, D>(deserializer: D) -> Result<Option<PriceRange>, D::Error>
where
    D: Deserializer<'de>,
{
    let bounds = Option::<Vec<Decimal>>::deserialize(deserializer)?;
    match bounds.as_deref() {
        None | Some([]) => Ok(None),
        Some(&[min, max]) => Ok(Some(PriceRange(min, max))),
        Some(other) => Err(D::Error::invalid_length(
            other.len(),
            &"an empty array or [min, max]",
        )),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Inclusive `[min, max]` price bounds, written as a two element array on the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange(pub Decimal, pub Decimal);

impl PriceRange {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self(min, max)
    }

    pub fn min(&self) -> Decimal {
        self.0
    }

    pub fn max(&self) -> Decimal {
        self.1
    }

    pub fn contains(&self, price: Decimal) -> bool {
        self.0 <= price && price <= self.1
    }

    fn validate(&self) -> InventoryResult<()> {
        if self.0 > self.1 {
            return Err(InventoryError::validation(format!(
                "price_range is inverted: {} > {}",
                self.0, self.1
            )));
        }
        Ok(())
    }
}

/// 1-indexed page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.limit as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    Category,
    Price,
    LastUpdatedDt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Single-field ordering. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::LastUpdatedDt,
            order: SortOrder::Desc,
        }
    }
}

impl Sort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    pub filters: Filters,
    /// When absent the whole ordered result set is returned.
    pub pagination: Option<Pagination>,
    pub sort: Sort,
}

impl Query {
    pub fn validate(&self) -> InventoryResult<()> {
        if let Some(range) = &self.filters.price_range {
            range.validate()?;
        }
        if let Some(p) = &self.pagination {
            if p.page == 0 {
                return Err(InventoryError::validation("page must start at 1"));
            }
            if p.limit == 0 {
                return Err(InventoryError::validation("limit must be positive"));
            }
        }
        Ok(())
    }

    /// Narrowing hints a store may use to avoid reading every record.
    pub(crate) fn pushdown(&self) -> ScanRequest {
        let label = non_blank(self.filters.category.as_deref());
        let category = match CategoryFilter::from_label(label) {
            CategoryFilter::Only(c) => Some(c),
            _ => None,
        };
        ScanRequest {
            category,
            price_range: self.filters.price_range,
            updated_between: None,
        }
    }

    /// Runs filter, sort and paginate over `records`.
    pub fn evaluate(&self, records: Vec<InventoryItem>) -> InventoryResult<QueryPage> {
        self.validate()?;

        let matcher = Matcher::new(&self.filters);
        let mut matched: Vec<InventoryItem> =
            records.into_iter().filter(|i| matcher.matches(i)).collect();
        matched.sort_by(|a, b| compare(a, b, &self.sort));

        let total = matched.len();
        let (items, page, limit) = match self.pagination {
            Some(p) => {
                let items: Vec<_> = matched
                    .into_iter()
                    .skip(p.offset())
                    .take(p.limit as usize)
                    .collect();
                (items, Some(p.page), Some(p.limit))
            }
            None => (matched, None, None),
        };

        Ok(QueryPage {
            count: items.len(),
            items,
            page,
            limit,
            total,
        })
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPage {
    pub items: Vec<InventoryItem>,
    /// Number of items on this page.
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Number of items matching the filters across all pages.
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CategoryFilter {
    Any,
    Only(Category),
    Unknown,
}

impl CategoryFilter {
    pub(crate) fn from_label(label: Option<&str>) -> Self {
        match label {
            None => CategoryFilter::Any,
            Some(l) => l
                .parse::<Category>()
                .map(CategoryFilter::Only)
                .unwrap_or(CategoryFilter::Unknown),
        }
    }

    pub(crate) fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::Any => true,
            CategoryFilter::Only(c) => *c == category,
            CategoryFilter::Unknown => false,
        }
    }
}

struct Matcher {
    name: Option<String>,
    category: CategoryFilter,
    price_range: Option<PriceRange>,
}

impl Matcher {
    fn new(filters: &Filters) -> Self {
        Self {
            name: non_blank(filters.name.as_deref()).map(str::to_lowercase),
            category: CategoryFilter::from_label(non_blank(filters.category.as_deref())),
            price_range: filters.price_range,
        }
    }

    fn matches(&self, item: &InventoryItem) -> bool {
        if let Some(needle) = &self.name {
            if !item.name.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }
        if !self.category.matches(item.category) {
            return false;
        }
        self.price_range.map_or(true, |r| r.contains(item.price))
    }
}

fn compare(a: &InventoryItem, b: &InventoryItem, sort: &Sort) -> Ordering {
    let primary = match sort.field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::Category => a.category.as_str().cmp(b.category.as_str()),
        SortField::Price => a.price.cmp(&b.price),
        SortField::LastUpdatedDt => a.last_updated_dt.cmp(&b.last_updated_dt),
    };
    let primary = match sort.order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| tie_break(a, b))
}

pub(crate) fn tie_break(a: &InventoryItem, b: &InventoryItem) -> Ordering {
    a.name
        .cmp(&b.name)
        .then_with(|| a.category.as_str().cmp(b.category.as_str()))
}
