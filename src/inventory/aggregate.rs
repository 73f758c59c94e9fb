use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{InventoryError, InventoryResult};
use crate::inventory::model::{Category, InventoryItem};
use crate::inventory::query::tie_break;

/// What an aggregation groups over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateScope {
    All,
    Category(Category),
}

impl AggregateScope {
    /// Reads `"all"` (any case) or a category label. Returns `None` for
    /// anything else.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("all") {
            return Some(AggregateScope::All);
        }
        label.parse().ok().map(AggregateScope::Category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotals {
    pub category: Category,
    pub count: usize,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    /// Serialized as `items`, the key HTTP clients read per-category rows from.
    #[serde(rename = "items")]
    pub groups: Vec<CategoryTotals>,
    pub count: usize,
    pub total_price: Decimal,
}

impl AggregateReport {
    pub fn empty() -> Self {
        Self {
            groups: Vec::new(),
            count: 0,
            total_price: Decimal::ZERO,
        }
    }

    fn from_groups(groups: Vec<CategoryTotals>) -> Self {
        let count = groups.iter().map(|g| g.count).sum();
        let total_price = groups.iter().map(|g| g.total_price).sum();
        Self {
            groups,
            count,
            total_price,
        }
    }
}

/// Groups `records` by category and sums their prices.
///
/// A single-category scope always yields exactly one group, even when it is
/// empty. The `All` scope yields one group per category that has records, in
/// category declaration order.
pub fn aggregate(records: &[InventoryItem], scope: AggregateScope) -> AggregateReport {
    let mut totals: BTreeMap<Category, (usize, Decimal)> = BTreeMap::new();
    for item in records {
        let in_scope = match scope {
            AggregateScope::All => true,
            AggregateScope::Category(c) => c == item.category,
        };
        if in_scope {
            let entry = totals.entry(item.category).or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += item.price;
        }
    }

    if let AggregateScope::Category(c) = scope {
        totals.entry(c).or_insert((0, Decimal::ZERO));
    }

    let groups = totals
        .into_iter()
        .map(|(category, (count, total_price))| CategoryTotals {
            category,
            count,
            total_price,
        })
        .collect();
    AggregateReport::from_groups(groups)
}

/// Inclusive window over `last_updated_dt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> InventoryResult<Self> {
        if from > to {
            return Err(InventoryError::validation(format!(
                "dt_from {} is after dt_to {}",
                from.to_rfc3339(),
                to.to_rfc3339()
            )));
        }
        Ok(Self { from, to })
    }

    /// Builds a range from the raw `dt_from`/`dt_to` strings of a request.
    pub fn parse(from: &str, to: &str) -> InventoryResult<Self> {
        Self::new(parse_timestamp(from)?, parse_timestamp(to)?)
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at <= self.to
    }
}

/// Accepts RFC 3339, a naive ISO date-time (taken as UTC) or a bare date
/// (midnight UTC).
pub fn parse_timestamp(raw: &str) -> InventoryResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(InventoryError::validation(format!("Invalid timestamp: {raw}")))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRangeReport {
    pub items: Vec<InventoryItem>,
    pub total_price: Decimal,
}

/// Keeps records updated inside `range`, oldest first, and sums their prices.
pub fn filter_by_date_range(records: Vec<InventoryItem>, range: &DateRange) -> DateRangeReport {
    let mut items: Vec<_> = records
        .into_iter()
        .filter(|i| range.contains(i.last_updated_dt))
        .collect();
    items.sort_by(|a, b| {
        a.last_updated_dt
            .cmp(&b.last_updated_dt)
            .then_with(|| tie_break(a, b))
    });
    let total_price = items.iter().map(|i| i.price).sum();
    DateRangeReport { items, total_price }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn item(name: &str, category: Category, price: &str) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            name: name.into(),
            category,
            price: price.parse().unwrap(),
            last_updated_dt: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn scope_parsing() {
        assert_eq!(AggregateScope::parse("ALL"), Some(AggregateScope::All));
        assert_eq!(AggregateScope::parse("aLl"), Some(AggregateScope::All));
        assert_eq!(
            AggregateScope::parse("music"),
            Some(AggregateScope::Category(Category::Music))
        );
        assert_eq!(AggregateScope::parse("Toys"), None);
        assert_eq!(AggregateScope::parse(""), None);
    }

    #[test]
    fn single_category_reports_empty_group() {
        let records = vec![item("Vinyl", Category::Music, "20")];
        let report = aggregate(&records, AggregateScope::Category(Category::Clothing));
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].category, Category::Clothing);
        assert_eq!(report.groups[0].count, 0);
        assert_eq!(report.total_price, Decimal::ZERO);
    }

    #[test]
    fn all_scope_skips_empty_categories() {
        let records = vec![
            item("Lipstick", Category::Beauty, "12.5"),
            item("Vinyl", Category::Music, "20"),
            item("Drum", Category::Music, "80"),
        ];
        let report = aggregate(&records, AggregateScope::All);
        let categories: Vec<_> = report.groups.iter().map(|g| g.category).collect();
        assert_eq!(categories, vec![Category::Music, Category::Beauty]);
        assert_eq!(report.groups[0].total_price, Decimal::from(100));
        assert_eq!(report.count, 3);
        assert_eq!(report.total_price, "112.5".parse::<Decimal>().unwrap());
    }

    #[test]
    fn sums_are_exact_decimals() {
        let records = vec![
            item("Gum", Category::Grocery, "0.1"),
            item("Mint", Category::Grocery, "0.2"),
        ];
        let expected: Decimal = "0.3".parse().unwrap();

        let report = aggregate(&records, AggregateScope::All);
        assert_eq!(report.total_price, expected);
        assert_eq!(report.groups[0].total_price, expected);

        let range = DateRange::parse("2024-01-01", "2024-01-02").unwrap();
        let in_range = filter_by_date_range(records, &range);
        assert_eq!(in_range.total_price, expected);
        assert_eq!(
            serde_json::to_value(&in_range).unwrap()["total_price"],
            serde_json::json!(0.3)
        );
    }

    #[test]
    fn report_rows_serialize_under_items() {
        let records = vec![item("Vinyl", Category::Music, "20")];
        let value = serde_json::to_value(aggregate(&records, AggregateScope::All)).unwrap();
        assert_eq!(value["items"][0]["category"], "Music");
        assert_eq!(value["items"][0]["count"], 1);
        assert_eq!(value["items"][0]["total_price"], serde_json::json!(20.0));
        assert!(value.get("groups").is_none());
    }

    #[test]
    fn parses_common_timestamp_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 9, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-09T10:30:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-09T12:30:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-09T10:30:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-03-09").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap()
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        assert!(DateRange::parse("2024-02-01", "2024-01-01").is_err());
        let same = DateRange::parse("2024-01-01", "2024-01-01").unwrap();
        assert!(same.contains(same.from()));
    }
}
