//! Product model and its row mapping.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

/// A catalog product as exchanged over the API.
///
/// An `id` of `0` on create means "let the store assign one".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Serialized as an exact JSON number, never through `f64`
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
    pub stock: i64,
}

impl Product {
    pub fn new(id: i64, name: impl Into<String>, price: Decimal, stock: i64) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            price,
            stock,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Raw `products` row. Prices are stored as decimal text.
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: i64,
}

impl TryFrom<ProductRow> for Product {
    type Error = rust_decimal::Error;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: Decimal::from_str(&row.price)?,
            stock: row.stock,
        })
    }
}
