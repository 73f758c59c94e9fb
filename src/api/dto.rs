use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{InventoryError, InventoryResult};
use crate::inventory::{Category, ItemKey, NewItem};

#[derive(Debug, Deserialize)]
pub struct UpsertRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
}

impl UpsertRequest {
    pub fn into_new_item(self) -> InventoryResult<NewItem> {
        let (Some(name), Some(category), Some(price)) = (&self.name, &self.category, self.price)
        else {
            return Err(missing_fields(&[
                ("name", self.name.is_none()),
                ("category", self.category.is_none()),
                ("price", self.price.is_none()),
            ]));
        };
        NewItem::new(name.clone(), category.parse::<Category>()?, price)
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub name: Option<String>,
    pub category: Option<String>,
}

impl DeleteRequest {
    pub fn into_key(self) -> InventoryResult<ItemKey> {
        let (Some(name), Some(category)) = (&self.name, &self.category) else {
            return Err(missing_fields(&[
                ("name", self.name.is_none()),
                ("category", self.category.is_none()),
            ]));
        };
        Ok(ItemKey::new(name.clone(), category.parse::<Category>()?))
    }
}

#[derive(Debug, Deserialize)]
pub struct DateRangeParams {
    pub dt_from: Option<String>,
    pub dt_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AggregateParams {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpsertResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn missing_fields(fields: &[(&str, bool)]) -> InventoryError {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| *name)
        .collect();
    InventoryError::validation(format!(
        "Missing required field(s): {}",
        missing.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_missing_field_in_order() {
        let request: UpsertRequest = serde_json::from_str(r#"{"name":"Pen"}"#).unwrap();
        let err = request.into_new_item().unwrap_err();
        assert_eq!(err.to_string(), "Missing required field(s): category, price");

        let request: DeleteRequest = serde_json::from_str(r#"{"category":"Books"}"#).unwrap();
        let err = request.into_key().unwrap_err();
        assert_eq!(err.to_string(), "Missing required field(s): name");
    }

    #[test]
    fn complete_request_builds_item() {
        let request: UpsertRequest =
            serde_json::from_str(r#"{"name":"Pen","category":"stationary","price":1.5}"#).unwrap();
        let item = request.into_new_item().unwrap();
        assert_eq!(item.category(), Category::Stationary);
        assert_eq!(item.price(), "1.5".parse::<Decimal>().unwrap());
    }

    #[test]
    fn price_accepts_number_or_string() {
        let request: UpsertRequest =
            serde_json::from_str(r#"{"name":"Gum","category":"Grocery","price":"0.10"}"#).unwrap();
        assert_eq!(request.price, Some(Decimal::new(1, 1)));
    }
}
