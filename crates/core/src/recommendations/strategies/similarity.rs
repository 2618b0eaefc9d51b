use std::sync::Arc;

use super::fail_soft;
use crate::domain::product::{Product, ProductId};
use crate::recommendations::ports::CatalogAccess;
use crate::recommendations::{RecommendationKind, StrategyResult};

/// Products sharing the seed's full attribute tuple, closest price first.
pub struct SimilarityStrategy {
    catalog: Arc<dyn CatalogAccess>,
}

impl SimilarityStrategy {
    pub fn new(catalog: Arc<dyn CatalogAccess>) -> Self {
        Self { catalog }
    }

    pub async fn recommend(&self, seed: ProductId, limit: usize) -> Vec<Product> {
        fail_soft(RecommendationKind::Similar, self.try_recommend(seed, limit).await)
    }

    pub async fn try_recommend(
        &self,
        seed: ProductId,
        limit: usize,
    ) -> StrategyResult<Vec<Product>> {
        let Some(seed_product) = self.catalog.get_product(seed).await? else {
            return Ok(Vec::new());
        };

        let mut matches = self
            .catalog
            .get_products_by_attributes(&seed_product.attributes)
            .await?
            .into_iter()
            .filter(|product| product.id != seed && product.is_eligible())
            .collect::<Vec<_>>();

        matches.sort_by(|a, b| {
            a.price_distance(&seed_product)
                .cmp(&b.price_distance(&seed_product))
                .then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(limit);
        Ok(matches)
    }
}
