//! Read-only contracts the engine consumes from the catalog and the interaction store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::interaction::{CandidateCount, ViewerKey};
use crate::domain::product::{CategoryId, Product, ProductAttributes, ProductId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DataAccessError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("data access timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait CatalogAccess: Send + Sync {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, DataAccessError>;

    async fn get_products_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, DataAccessError>;

    /// Exact match on all four attributes.
    async fn get_products_by_attributes(
        &self,
        attributes: &ProductAttributes,
    ) -> Result<Vec<Product>, DataAccessError>;

    /// Every product flagged active, regardless of stock.
    async fn list_active_products(&self) -> Result<Vec<Product>, DataAccessError>;
}

#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Products sharing at least one order with `seed`, by shared-order count
    /// descending. Never contains `seed` itself.
    async fn get_co_purchased_candidates(
        &self,
        seed: ProductId,
    ) -> Result<Vec<CandidateCount>, DataAccessError>;

    /// Distinct product ids, most recently viewed first.
    async fn get_recently_viewed_product_ids(
        &self,
        viewer: &ViewerKey,
        limit: usize,
    ) -> Result<Vec<ProductId>, DataAccessError>;

    /// Products viewed after `seed` by viewers of `seed`, with the number of
    /// distinct such viewers.
    async fn get_co_viewed_candidates(
        &self,
        seed: ProductId,
    ) -> Result<Vec<CandidateCount>, DataAccessError>;

    async fn get_average_rating(&self, id: ProductId) -> Result<Option<f64>, DataAccessError>;

    async fn get_view_count(&self, id: ProductId) -> Result<u64, DataAccessError>;

    async fn get_view_count_since(
        &self,
        id: ProductId,
        since: DateTime<Utc>,
    ) -> Result<u64, DataAccessError>;

    /// All viewed product ids by all-time view count descending.
    async fn get_most_viewed_product_ids(&self) -> Result<Vec<ProductId>, DataAccessError>;
}
