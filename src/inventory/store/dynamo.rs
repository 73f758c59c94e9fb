use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::dynamodb::{
    DynamoDb, FieldType, Item, QueryParams, ScanParams, Schema, SecondaryIndex, Table,
};
use crate::error::InventoryResult;
use crate::inventory::model::{Category, InventoryItem, ItemKey, NewItem};
use crate::inventory::store::{InventoryStore, ScanRequest};
use crate::utils::retry_with_backoff;

const NAME: &str = "name";
const CATEGORY: &str = "category";
const PRICE: &str = "price";
const LAST_UPDATED_DT: &str = "last_updated_dt";
const ID: &str = "id";

pub const CATEGORY_PRICE_INDEX: &str = "CategoryPriceIndex";

/// Inventory records in a DynamoDB table keyed by `name` + `category`.
///
/// Reads filtered by category go through `CategoryPriceIndex`, everything else
/// is a filtered scan.
#[derive(Debug, Clone)]
pub struct DynamoStore {
    ddb: DynamoDb,
    table_name: String,
}

impl DynamoStore {
    pub fn new(ddb: DynamoDb, table_name: impl Into<String>) -> Self {
        Self {
            ddb,
            table_name: table_name.into(),
        }
    }

    pub fn table(&self) -> Table<'_> {
        inventory_table(&self.table_name)
    }

    /// Creates the table when missing and waits until it and its index can
    /// serve reads.
    pub async fn bootstrap(&self) -> Result<()> {
        self.ddb.check_auth().await?;
        self.ddb.create_table_if_not_exists(&self.table()).await?;
        retry_with_backoff(
            || self.ddb.ensure_active(&self.table_name),
            Duration::from_secs(1),
            8,
        )
        .await?;
        info!("Table '{}' is active", self.table_name);
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for DynamoStore {
    async fn upsert(&self, item: NewItem, at: DateTime<Utc>) -> InventoryResult<InventoryItem> {
        let key = key_item(&item.key());
        let updates = Item::new()
            .set_number(PRICE, item.price())
            .set_string(LAST_UPDATED_DT, format_timestamp(at));
        let defaults = Item::new().set_string(ID, Uuid::new_v4().to_string());

        let stored = self
            .ddb
            .update_item(&self.table_name, key, updates, defaults)
            .await?;
        Ok(decode(stored)?)
    }

    async fn delete(&self, key: &ItemKey) -> InventoryResult<()> {
        self.ddb
            .delete_item(&self.table_name, key_item(key))
            .await?;
        Ok(())
    }

    async fn find(&self, request: &ScanRequest) -> InventoryResult<Vec<InventoryItem>> {
        let plan = ReadPlan::for_request(request);
        debug!("Reading '{}' with {:?}", self.table_name, plan);

        let items = match plan.key_condition {
            Some(key_condition_expression) => {
                self.ddb
                    .query(QueryParams {
                        table_name: &self.table_name,
                        index_name: Some(CATEGORY_PRICE_INDEX),
                        key_condition_expression,
                        filter_expression: plan.filter,
                        expression_attribute_names: plan.names,
                        expression_attribute_values: plan.values,
                    })
                    .await?
            }
            None => {
                let has_filter = plan.filter.is_some();
                self.ddb
                    .scan(ScanParams {
                        table_name: &self.table_name,
                        filter_expression: plan.filter,
                        expression_attribute_names: has_filter.then_some(plan.names),
                        expression_attribute_values: has_filter.then_some(plan.values),
                    })
                    .await?
            }
        };

        let records = items
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<InventoryItem>>>()?;
        Ok(records)
    }
}

/// Layout of the inventory table: `name` + `category` primary key and a
/// `category` + `price` index.
pub fn inventory_table(table_name: &str) -> Table<'_> {
    Table::new(table_name, NAME, Some(CATEGORY))
        .with_schema(
            Schema::new()
                .add_field(NAME, FieldType::String)
                .add_field(CATEGORY, FieldType::String)
                .add_field(PRICE, FieldType::Number),
        )
        .with_index(SecondaryIndex::new(
            CATEGORY_PRICE_INDEX,
            CATEGORY,
            Some(PRICE),
        ))
}

/// Every stored attribute except `price`, which is read from its raw number
/// string so no precision is lost.
#[derive(Debug, Deserialize)]
struct StoredRecord {
    id: Uuid,
    name: String,
    category: Category,
    last_updated_dt: DateTime<Utc>,
}

fn decode(item: Item) -> Result<InventoryItem> {
    let price = item.get_decimal(PRICE)?;
    let StoredRecord {
        id,
        name,
        category,
        last_updated_dt,
    } = item.deserialize()?;
    Ok(InventoryItem {
        id,
        name,
        category,
        price,
        last_updated_dt,
    })
}

fn number(value: Decimal) -> AttributeValue {
    AttributeValue::N(value.normalize().to_string())
}

fn key_item(key: &ItemKey) -> Item {
    Item::new()
        .set_string(NAME, key.name.clone())
        .set_string(CATEGORY, key.category.as_str())
}

/// Fixed-width UTC timestamps so string order matches time order.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Expressions for one read: a key condition on the category index when the
/// request names a category, otherwise only a scan filter.
#[derive(Debug, Default)]
struct ReadPlan {
    key_condition: Option<String>,
    filter: Option<String>,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl ReadPlan {
    fn for_request(request: &ScanRequest) -> Self {
        let mut plan = ReadPlan::default();
        let mut key_clauses = Vec::new();
        let mut filter_clauses = Vec::new();

        if let Some(category) = request.category {
            plan.names.insert("#category".into(), CATEGORY.into());
            plan.values.insert(
                ":category".into(),
                AttributeValue::S(category.as_str().into()),
            );
            key_clauses.push("#category = :category".to_string());
        }

        if let Some(range) = request.price_range {
            plan.names.insert("#price".into(), PRICE.into());
            plan.values.insert(":min_price".into(), number(range.min()));
            plan.values.insert(":max_price".into(), number(range.max()));
            let clause = "#price BETWEEN :min_price AND :max_price".to_string();
            // Price is the index sort key, so it can narrow the key condition.
            if key_clauses.is_empty() {
                filter_clauses.push(clause);
            } else {
                key_clauses.push(clause);
            }
        }

        if let Some((from, to)) = request.updated_between {
            plan.names.insert("#updated".into(), LAST_UPDATED_DT.into());
            plan.values
                .insert(":dt_from".into(), AttributeValue::S(format_timestamp(from)));
            plan.values
                .insert(":dt_to".into(), AttributeValue::S(format_timestamp(to)));
            filter_clauses.push("#updated BETWEEN :dt_from AND :dt_to".to_string());
        }

        if !key_clauses.is_empty() {
            plan.key_condition = Some(key_clauses.join(" AND "));
        }
        if !filter_clauses.is_empty() {
            plan.filter = Some(filter_clauses.join(" AND "));
        }
        plan
    }
}
