use std::sync::Arc;

use super::{fail_soft, resolve_eligible};
use crate::domain::interaction::ViewerKey;
use crate::domain::product::Product;
use crate::recommendations::ports::{CatalogAccess, InteractionStore};
use crate::recommendations::{RecommendationKind, StrategyResult};

/// The viewer's own most recent distinct views, still eligible.
pub struct RecentlyViewedStrategy {
    catalog: Arc<dyn CatalogAccess>,
    interactions: Arc<dyn InteractionStore>,
}

impl RecentlyViewedStrategy {
    pub fn new(catalog: Arc<dyn CatalogAccess>, interactions: Arc<dyn InteractionStore>) -> Self {
        Self { catalog, interactions }
    }

    pub async fn recommend(&self, viewer: &ViewerKey, limit: usize) -> Vec<Product> {
        fail_soft(RecommendationKind::RecentlyViewed, self.try_recommend(viewer, limit).await)
    }

    pub async fn try_recommend(
        &self,
        viewer: &ViewerKey,
        limit: usize,
    ) -> StrategyResult<Vec<Product>> {
        let recent = self.interactions.get_recently_viewed_product_ids(viewer, limit).await?;
        resolve_eligible(self.catalog.as_ref(), recent, limit).await
    }
}
