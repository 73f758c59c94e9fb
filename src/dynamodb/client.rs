use anyhow::{anyhow, Result};
use aws_sdk_dynamodb::{
    operation::{create_table::CreateTableOutput, describe_table::DescribeTableOutput},
    types::{
        AttributeDefinition, AttributeValue, BillingMode, GlobalSecondaryIndex, IndexStatus,
        KeySchemaElement, KeyType, Projection, ProjectionType, ReturnValue, TableStatus,
    },
    Client,
};
use std::collections::HashMap;
use tracing::{debug, error, info};

use crate::dynamodb::{Item, Table};

/// Shared handle to the DynamoDB SDK client.
///
/// Cloning is cheap; clones share the underlying connection pool. Every call
/// returns `anyhow::Result` and leaves it to the caller to wrap failures in
/// its own error type.
#[derive(Debug, Clone)]
pub struct DynamoDb {
    client: Client,
}

/// A key-condition read against a table or one of its indexes.
#[derive(Debug, Clone)]
pub struct QueryParams<'a> {
    pub table_name: &'a str,
    pub index_name: Option<&'a str>,
    pub key_condition_expression: String,
    pub filter_expression: Option<String>,
    pub expression_attribute_names: HashMap<String, String>,
    pub expression_attribute_values: HashMap<String, AttributeValue>,
}

/// A full-table read, optionally narrowed by a filter expression.
///
/// Names and values must be `None` when there is no filter; DynamoDB rejects
/// empty expression maps.
#[derive(Debug, Clone)]
pub struct ScanParams<'a> {
    pub table_name: &'a str,
    pub filter_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub expression_attribute_values: Option<HashMap<String, AttributeValue>>,
}

impl DynamoDb {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }

    /// Fails fast when credentials or the endpoint are wrong.
    pub async fn check_auth(&self) -> Result<()> {
        self.client.list_tables().send().await.map_err(|e| {
            error!("Authentication failed: {}", e);
            anyhow!("Authentication failed")
        })?;
        info!("Authentication successful");
        Ok(())
    }

    /// Creates a table, including its global secondary indexes, if it doesn't exist.
    pub async fn create_table_if_not_exists(
        &self,
        table: &Table<'_>,
    ) -> Result<Option<CreateTableOutput>> {
        if self.table_exists(table.name()).await? {
            info!("Table '{}' exists", table.name());
            return Ok(None);
        }

        let schema = table.schema().cloned().unwrap_or_default();

        let attribute_definitions = table
            .key_attributes()
            .into_iter()
            .map(|name| {
                AttributeDefinition::builder()
                    .attribute_name(name)
                    .attribute_type(schema.field_type(name).scalar_type())
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let table_key_schema = key_schema(table.partition_key(), table.sort_key())?;

        let indexes = table
            .indexes()
            .iter()
            .map(|index| -> Result<GlobalSecondaryIndex> {
                Ok(GlobalSecondaryIndex::builder()
                    .index_name(index.name())
                    .set_key_schema(Some(key_schema(index.partition_key(), index.sort_key())?))
                    .projection(
                        Projection::builder()
                            .projection_type(ProjectionType::All)
                            .build(),
                    )
                    .build()?)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut request = self
            .client
            .create_table()
            .table_name(table.name())
            .billing_mode(BillingMode::PayPerRequest)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(table_key_schema));

        if !indexes.is_empty() {
            request = request.set_global_secondary_indexes(Some(indexes));
        }

        let output = request.send().await?;
        info!("Table '{}' created", table.name());
        Ok(Some(output))
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let tables = self.client.list_tables().send().await?;
        Ok(tables.table_names().contains(&table_name.to_string()))
    }

    pub async fn describe_table(&self, table_name: &str) -> Result<DescribeTableOutput> {
        self.client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(Into::into)
    }

    /// Fails unless the table and all of its indexes are `ACTIVE`.
    pub async fn ensure_active(&self, table_name: &str) -> Result<()> {
        let description = self.describe_table(table_name).await?;
        let table = description
            .table()
            .ok_or_else(|| anyhow!("Table '{table_name}' has no description"))?;

        if table.table_status() != Some(&TableStatus::Active) {
            return Err(anyhow!(
                "Table '{table_name}' is {:?}",
                table.table_status()
            ));
        }

        for index in table.global_secondary_indexes() {
            if index.index_status() != Some(&IndexStatus::Active) {
                return Err(anyhow!(
                    "Index {:?} of '{table_name}' is {:?}",
                    index.index_name(),
                    index.index_status()
                ));
            }
        }
        Ok(())
    }

    /// Applies `SET` updates to the item at `key`, creating it when absent.
    ///
    /// Attributes in `updates` are always overwritten. Attributes in
    /// `defaults` are only written if the item does not have them yet. The
    /// whole update is a single atomic write. Returns the item as stored
    /// afterwards.
    pub async fn update_item(
        &self,
        table_name: &str,
        key: Item,
        updates: Item,
        defaults: Item,
    ) -> Result<Item> {
        let (update_expression, expression_attribute_names, expression_attribute_values) =
            set_expression(updates, defaults)?;

        let response = self
            .client
            .update_item()
            .table_name(table_name)
            .set_key(Some(key.attributes))
            .update_expression(update_expression)
            .set_expression_attribute_names(Some(expression_attribute_names))
            .set_expression_attribute_values(Some(expression_attribute_values))
            .return_values(ReturnValue::AllNew)
            .send()
            .await?;

        debug!("Item updated in '{table_name}'");
        response
            .attributes
            .map(Item::from_attributes)
            .ok_or_else(|| anyhow!("update_item returned no attributes"))
    }

    /// Deletes an item from a DynamoDB table. Deleting a missing item succeeds.
    pub async fn delete_item(&self, table_name: &str, key: Item) -> Result<()> {
        self.client
            .delete_item()
            .table_name(table_name)
            .set_key(Some(key.attributes))
            .send()
            .await?;

        debug!("Item deleted from '{table_name}'");
        Ok(())
    }

    /// Queries a table or index, following `LastEvaluatedKey` until exhausted.
    pub async fn query(&self, params: QueryParams<'_>) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let page = self
                .client
                .query()
                .table_name(params.table_name)
                .set_index_name(params.index_name.map(str::to_string))
                .key_condition_expression(&params.key_condition_expression)
                .set_filter_expression(params.filter_expression.clone())
                .set_expression_attribute_names(Some(params.expression_attribute_names.clone()))
                .set_expression_attribute_values(Some(params.expression_attribute_values.clone()))
                .set_exclusive_start_key(exclusive_start_key.take())
                .send()
                .await?;

            items.extend(
                page.items
                    .unwrap_or_default()
                    .into_iter()
                    .map(Item::from_attributes),
            );
            match page.last_evaluated_key {
                Some(key) => exclusive_start_key = Some(key),
                None => break,
            }
        }

        debug!("Query on '{}' returned {} item(s)", params.table_name, items.len());
        Ok(items)
    }

    /// Scans a whole table page by page.
    pub async fn scan(&self, params: ScanParams<'_>) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let page = self
                .client
                .scan()
                .table_name(params.table_name)
                .set_filter_expression(params.filter_expression.clone())
                .set_expression_attribute_names(params.expression_attribute_names.clone())
                .set_expression_attribute_values(params.expression_attribute_values.clone())
                .set_exclusive_start_key(exclusive_start_key.take())
                .send()
                .await?;

            items.extend(
                page.items
                    .unwrap_or_default()
                    .into_iter()
                    .map(Item::from_attributes),
            );
            match page.last_evaluated_key {
                Some(key) => exclusive_start_key = Some(key),
                None => break,
            }
        }

        debug!("Scan of '{}' returned {} item(s)", params.table_name, items.len());
        Ok(items)
    }
}

type ExpressionParts = (
    String,
    HashMap<String, String>,
    HashMap<String, AttributeValue>,
);

/// Builds a `SET` update expression with placeholder names and values.
fn set_expression(updates: Item, defaults: Item) -> Result<ExpressionParts> {
    let mut clauses = Vec::new();
    let mut names = HashMap::new();
    let mut values = HashMap::new();

    let assignments = updates
        .attributes
        .into_iter()
        .map(|attr| (attr, false))
        .chain(defaults.attributes.into_iter().map(|attr| (attr, true)));

    for (i, ((attr_name, attr_value), keep_existing)) in assignments.enumerate() {
        let placeholder = format!("#set{i}");
        let value_placeholder = format!(":set{i}");

        if keep_existing {
            clauses.push(format!(
                "{placeholder} = if_not_exists({placeholder}, {value_placeholder})"
            ));
        } else {
            clauses.push(format!("{placeholder} = {value_placeholder}"));
        }

        names.insert(placeholder, attr_name);
        values.insert(value_placeholder, attr_value);
    }

    if clauses.is_empty() {
        return Err(anyhow!("update_item called without attributes to set"));
    }

    Ok((format!("SET {}", clauses.join(", ")), names, values))
}

fn key_schema(partition_key: &str, sort_key: Option<&str>) -> Result<Vec<KeySchemaElement>> {
    std::iter::once((partition_key, KeyType::Hash))
        .chain(sort_key.map(|name| (name, KeyType::Range)))
        .map(|(name, key_type)| -> Result<KeySchemaElement> {
            Ok(KeySchemaElement::builder()
                .attribute_name(name)
                .key_type(key_type)
                .build()?)
        })
        .collect()
}
