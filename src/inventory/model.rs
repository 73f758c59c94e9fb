use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{InventoryError, InventoryResult};

/// Smallest price an item may carry.
pub const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Closed set of category labels an item can belong to.
///
/// Labels serialize in their capitalized form ("Music"). Parsing from user
/// input through [`FromStr`] ignores case, so "music" and "MUSIC" are accepted
/// as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Music,
    Grocery,
    Clothing,
    Home,
    Books,
    Outdoors,
    Electrics,
    Beauty,
    Stationary,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 9] = [
        Category::Music,
        Category::Grocery,
        Category::Clothing,
        Category::Home,
        Category::Books,
        Category::Outdoors,
        Category::Electrics,
        Category::Beauty,
        Category::Stationary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Music => "Music",
            Category::Grocery => "Grocery",
            Category::Clothing => "Clothing",
            Category::Home => "Home",
            Category::Books => "Books",
            Category::Outdoors => "Outdoors",
            Category::Electrics => "Electrics",
            Category::Beauty => "Beauty",
            Category::Stationary => "Stationary",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| InventoryError::validation(format!("Invalid category: {s}")))
    }
}

/// Natural key of an inventory record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey {
    pub name: String,
    pub category: Category,
}

impl ItemKey {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }
}

/// A stored inventory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    pub price: Decimal,
    pub last_updated_dt: DateTime<Utc>,
}

/// Validated input for an upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    name: String,
    category: Category,
    price: Decimal,
}

impl NewItem {
    /// Checks the item against the write rules: a non-blank name and a
    /// price of at least [`MIN_PRICE`].
    pub fn new(
        name: impl Into<String>,
        category: Category,
        price: Decimal,
    ) -> InventoryResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(InventoryError::validation("name must not be empty"));
        }
        if price < MIN_PRICE {
            return Err(InventoryError::validation(format!(
                "price must be at least {MIN_PRICE}"
            )));
        }
        Ok(Self {
            name,
            category,
            price,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.name.clone(), self.category)
    }
}
