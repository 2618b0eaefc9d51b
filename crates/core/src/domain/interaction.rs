use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

/// Identifies whoever is browsing: a signed-in user or an anonymous network address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ViewerKey {
    User(i64),
    Anonymous(String),
}

impl fmt::Display for ViewerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Anonymous(address) => write!(f, "anon:{address}"),
        }
    }
}

impl FromStr for ViewerKey {
    type Err = DomainError;

    /// Accepts `user:<id>`, `anon:<address>`, a bare numeric user id, or a bare address.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err(DomainError::InvalidViewerKey(value.to_string()));
        }

        if let Some(id) = value.strip_prefix("user:") {
            return id
                .trim()
                .parse::<i64>()
                .map(Self::User)
                .map_err(|_| DomainError::InvalidViewerKey(value.to_string()));
        }

        if let Some(address) = value.strip_prefix("anon:") {
            let address = address.trim();
            if address.is_empty() {
                return Err(DomainError::InvalidViewerKey(value.to_string()));
            }
            return Ok(Self::Anonymous(address.to_string()));
        }

        match value.parse::<i64>() {
            Ok(id) => Ok(Self::User(id)),
            Err(_) => Ok(Self::Anonymous(value.to_string())),
        }
    }
}

/// One line of a completed order. Orders sharing an id form the co-purchase basket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoPurchaseFact {
    pub order_id: OrderId,
    pub product_id: ProductId,
}

/// Append-only page view record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEvent {
    pub viewer: ViewerKey,
    pub product_id: ProductId,
    pub viewed_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub product_id: ProductId,
    /// 1..=5
    pub rating: u8,
}

/// A candidate product with the number of orders (or viewers) it shares with a seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCount {
    pub product_id: ProductId,
    pub count: u32,
}

impl CandidateCount {
    pub fn new(product_id: ProductId, count: u32) -> Self {
        Self { product_id, count }
    }
}
