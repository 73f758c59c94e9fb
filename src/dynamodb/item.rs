use anyhow::{anyhow, Context, Result};
use aws_sdk_dynamodb::types::AttributeValue;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Raw attribute map sent to or read back from DynamoDB.
///
/// Built with the `set_*` methods for keys and updates; decoded into typed
/// records with [`Item::deserialize`].
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Item {
    pub(crate) attributes: HashMap<String, AttributeValue>,
}

impl Item {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_attributes(attributes: HashMap<String, AttributeValue>) -> Self {
        Self { attributes }
    }

    /// Sets a string attribute.
    pub fn set_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(key.into(), AttributeValue::S(value.into()));
        self
    }

    /// Sets a number attribute.
    ///
    /// DynamoDB transports numbers as strings and stores them with up to 38
    /// digits of precision, which covers every `Decimal`.
    pub fn set_number(mut self, key: impl Into<String>, value: Decimal) -> Self {
        self.attributes
            .insert(key.into(), AttributeValue::N(value.normalize().to_string()));
        self
    }

    /// Reads a number attribute without going through a float.
    pub fn get_decimal(&self, key: &str) -> Result<Decimal> {
        let raw = self
            .attributes
            .get(key)
            .ok_or_else(|| anyhow!("attribute '{key}' is missing"))?
            .as_n()
            .map_err(|_| anyhow!("attribute '{key}' is not a number"))?;
        raw.parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(raw))
            .with_context(|| format!("attribute '{key}' holds unreadable number '{raw}'"))
    }

    /// Decodes the item into a typed record.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_dynamo::from_item(self.attributes)?)
    }
}
