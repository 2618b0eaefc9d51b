//! Fixtures shared by the recommendation tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use super::memory::InMemoryStore;
use super::ports::{CatalogAccess, DataAccessError, InteractionStore};
use crate::domain::interaction::{CandidateCount, Review, ViewEvent, ViewerKey};
use crate::domain::product::{CategoryId, Product, ProductAttributes, ProductId};

pub struct ProductBuilder {
    product: Product,
}

pub fn product(id: i64) -> ProductBuilder {
    ProductBuilder {
        product: Product {
            id: ProductId(id),
            name: format!("Product {id}"),
            category_id: None,
            price: Decimal::new(100, 0),
            stock_quantity: 5,
            active: true,
            attributes: ProductAttributes::default(),
        },
    }
}

impl ProductBuilder {
    pub fn category(mut self, category: i64) -> Self {
        self.product.category_id = Some(CategoryId(category));
        self
    }

    pub fn price(mut self, price: i64) -> Self {
        self.product.price = Decimal::new(price, 0);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.product.active = false;
        self
    }

    pub fn out_of_stock(mut self) -> Self {
        self.product.stock_quantity = 0;
        self
    }

    pub fn attributes(mut self, color: &str, material: &str) -> Self {
        self.product.attributes = ProductAttributes {
            color: Some(color.to_string()),
            material: Some(material.to_string()),
            usage_area: Some("kitchen".to_string()),
            mounting_type: Some("wall".to_string()),
        };
        self
    }

    pub fn build(self) -> Product {
        self.product
    }
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).single().expect("valid timestamp")
}

pub fn user(id: i64) -> ViewerKey {
    ViewerKey::User(id)
}

pub fn view(viewer: &ViewerKey, product_id: i64, at: DateTime<Utc>) -> ViewEvent {
    ViewEvent { viewer: viewer.clone(), product_id: ProductId(product_id), viewed_at: at }
}

pub async fn review(store: &InMemoryStore, product_id: i64, ratings: &[u8]) {
    for rating in ratings {
        store.record_review(Review { product_id: ProductId(product_id), rating: *rating }).await;
    }
}

/// Records `count` views of a product, one minute apart, ending at `last`.
pub async fn views(store: &InMemoryStore, product_id: i64, count: i64, last: DateTime<Utc>) {
    for offset in 0..count {
        let viewer = ViewerKey::Anonymous(format!("10.0.0.{offset}"));
        store.record_view(view(&viewer, product_id, last - Duration::minutes(offset))).await;
    }
}

pub fn ids(products: &[Product]) -> Vec<i64> {
    products.iter().map(|product| product.id.0).collect()
}

pub fn shared(store: InMemoryStore) -> (Arc<dyn CatalogAccess>, Arc<dyn InteractionStore>) {
    let store = Arc::new(store);
    (store.clone(), store)
}

/// Store whose every call fails, or never completes when `hang` is set.
pub struct BrokenStore {
    pub hang: bool,
}

impl BrokenStore {
    async fn fail<T: Send>(&self) -> Result<T, DataAccessError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        Err(DataAccessError::Unavailable("connection refused".to_string()))
    }
}

pub fn broken(hang: bool) -> (Arc<dyn CatalogAccess>, Arc<dyn InteractionStore>) {
    let store = Arc::new(BrokenStore { hang });
    (store.clone(), store)
}

#[async_trait]
impl CatalogAccess for BrokenStore {
    async fn get_product(&self, _id: ProductId) -> Result<Option<Product>, DataAccessError> {
        self.fail().await
    }

    async fn get_products_by_category(
        &self,
        _category_id: CategoryId,
    ) -> Result<Vec<Product>, DataAccessError> {
        self.fail().await
    }

    async fn get_products_by_attributes(
        &self,
        _attributes: &ProductAttributes,
    ) -> Result<Vec<Product>, DataAccessError> {
        self.fail().await
    }

    async fn list_active_products(&self) -> Result<Vec<Product>, DataAccessError> {
        self.fail().await
    }
}

#[async_trait]
impl InteractionStore for BrokenStore {
    async fn get_co_purchased_candidates(
        &self,
        _seed: ProductId,
    ) -> Result<Vec<CandidateCount>, DataAccessError> {
        self.fail().await
    }

    async fn get_recently_viewed_product_ids(
        &self,
        _viewer: &ViewerKey,
        _limit: usize,
    ) -> Result<Vec<ProductId>, DataAccessError> {
        self.fail().await
    }

    async fn get_co_viewed_candidates(
        &self,
        _seed: ProductId,
    ) -> Result<Vec<CandidateCount>, DataAccessError> {
        self.fail().await
    }

    async fn get_average_rating(&self, _id: ProductId) -> Result<Option<f64>, DataAccessError> {
        self.fail().await
    }

    async fn get_view_count(&self, _id: ProductId) -> Result<u64, DataAccessError> {
        self.fail().await
    }

    async fn get_view_count_since(
        &self,
        _id: ProductId,
        _since: DateTime<Utc>,
    ) -> Result<u64, DataAccessError> {
        self.fail().await
    }

    async fn get_most_viewed_product_ids(&self) -> Result<Vec<ProductId>, DataAccessError> {
        self.fail().await
    }
}
