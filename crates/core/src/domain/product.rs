use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub i64);

/// Attribute tuple used for "similar product" matching. All four fields must be
/// equal for two products to count as similar; `None` only matches `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductAttributes {
    pub color: Option<String>,
    pub material: Option<String>,
    pub usage_area: Option<String>,
    pub mounting_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category_id: Option<CategoryId>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub active: bool,
    pub attributes: ProductAttributes,
}

impl Product {
    /// Active and in stock.
    pub fn is_eligible(&self) -> bool {
        self.active && self.stock_quantity > 0
    }

    pub fn price_distance(&self, other: &Product) -> Decimal {
        (self.price - other.price).abs()
    }
}
