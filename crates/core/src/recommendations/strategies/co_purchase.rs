use std::sync::Arc;

use super::{fail_soft, resolve_eligible};
use crate::domain::product::{Product, ProductId};
use crate::recommendations::ports::{CatalogAccess, InteractionStore};
use crate::recommendations::{
    RecommendationKind, StrategyResult, MAX_RECOMMENDATIONS, MIN_CO_PURCHASE,
};

/// "Frequently bought together": products sharing at least [`MIN_CO_PURCHASE`]
/// orders with the seed, most shared orders first.
pub struct CoPurchaseStrategy {
    catalog: Arc<dyn CatalogAccess>,
    interactions: Arc<dyn InteractionStore>,
}

impl CoPurchaseStrategy {
    pub fn new(catalog: Arc<dyn CatalogAccess>, interactions: Arc<dyn InteractionStore>) -> Self {
        Self { catalog, interactions }
    }

    pub async fn recommend(&self, seed: ProductId) -> Vec<Product> {
        fail_soft(RecommendationKind::CoPurchase, self.try_recommend(seed).await)
    }

    pub async fn try_recommend(&self, seed: ProductId) -> StrategyResult<Vec<Product>> {
        let candidates = self.interactions.get_co_purchased_candidates(seed).await?;
        let retained = candidates
            .into_iter()
            .filter(|candidate| candidate.count >= MIN_CO_PURCHASE)
            .map(|candidate| candidate.product_id)
            .filter(|product_id| *product_id != seed);

        resolve_eligible(self.catalog.as_ref(), retained, MAX_RECOMMENDATIONS).await
    }
}
