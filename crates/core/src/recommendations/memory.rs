use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::aggregate;
use super::ports::{CatalogAccess, DataAccessError, InteractionStore};
use crate::domain::interaction::{
    CandidateCount, CoPurchaseFact, OrderId, Review, ViewEvent, ViewerKey,
};
use crate::domain::product::{CategoryId, Product, ProductAttributes, ProductId};

#[derive(Default)]
struct StoreState {
    products: BTreeMap<ProductId, Product>,
    order_lines: Vec<CoPurchaseFact>,
    views: Vec<ViewEvent>,
    reviews: Vec<Review>,
}

/// Catalog and interaction read model held in process memory.
///
/// Backs tests and local demos; the write methods only exist to load data, the
/// engine itself only reads through [`CatalogAccess`] and [`InteractionStore`].
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert_product(&self, product: Product) {
        let mut state = self.state.write().await;
        state.products.insert(product.id, product);
    }

    pub async fn record_order(&self, order_id: OrderId, product_ids: &[ProductId]) {
        let mut state = self.state.write().await;
        state
            .order_lines
            .extend(product_ids.iter().map(|product_id| CoPurchaseFact {
                order_id,
                product_id: *product_id,
            }));
    }

    pub async fn record_view(&self, event: ViewEvent) {
        self.state.write().await.views.push(event);
    }

    pub async fn record_review(&self, review: Review) {
        self.state.write().await.reviews.push(review);
    }
}

#[async_trait]
impl CatalogAccess for InMemoryStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, DataAccessError> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn get_products_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, DataAccessError> {
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .filter(|product| product.category_id == Some(category_id))
            .cloned()
            .collect())
    }

    async fn get_products_by_attributes(
        &self,
        attributes: &ProductAttributes,
    ) -> Result<Vec<Product>, DataAccessError> {
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .filter(|product| &product.attributes == attributes)
            .cloned()
            .collect())
    }

    async fn list_active_products(&self) -> Result<Vec<Product>, DataAccessError> {
        let state = self.state.read().await;
        Ok(state.products.values().filter(|product| product.active).cloned().collect())
    }
}

#[async_trait]
impl InteractionStore for InMemoryStore {
    async fn get_co_purchased_candidates(
        &self,
        seed: ProductId,
    ) -> Result<Vec<CandidateCount>, DataAccessError> {
        Ok(aggregate::co_purchase_counts(&self.state.read().await.order_lines, seed))
    }

    async fn get_recently_viewed_product_ids(
        &self,
        viewer: &ViewerKey,
        limit: usize,
    ) -> Result<Vec<ProductId>, DataAccessError> {
        Ok(aggregate::recently_viewed(&self.state.read().await.views, viewer, limit))
    }

    async fn get_co_viewed_candidates(
        &self,
        seed: ProductId,
    ) -> Result<Vec<CandidateCount>, DataAccessError> {
        Ok(aggregate::co_view_counts(&self.state.read().await.views, seed))
    }

    async fn get_average_rating(&self, id: ProductId) -> Result<Option<f64>, DataAccessError> {
        Ok(aggregate::average_rating(&self.state.read().await.reviews, id))
    }

    async fn get_view_count(&self, id: ProductId) -> Result<u64, DataAccessError> {
        Ok(aggregate::view_count_since(&self.state.read().await.views, id, None))
    }

    async fn get_view_count_since(
        &self,
        id: ProductId,
        since: DateTime<Utc>,
    ) -> Result<u64, DataAccessError> {
        Ok(aggregate::view_count_since(&self.state.read().await.views, id, Some(since)))
    }

    async fn get_most_viewed_product_ids(&self) -> Result<Vec<ProductId>, DataAccessError> {
        Ok(aggregate::most_viewed(&self.state.read().await.views))
    }
}
