use std::sync::Arc;

use super::{compare_ratings_desc, fail_soft};
use crate::domain::product::{Product, ProductId};
use crate::recommendations::ports::{CatalogAccess, InteractionStore};
use crate::recommendations::{RecommendationKind, StrategyResult};

/// Best rated products in the seed's category, most viewed first among equals.
pub struct CategoryFallbackStrategy {
    catalog: Arc<dyn CatalogAccess>,
    interactions: Arc<dyn InteractionStore>,
}

struct RankedProduct {
    product: Product,
    rating: Option<f64>,
    views: u64,
}

impl CategoryFallbackStrategy {
    pub fn new(catalog: Arc<dyn CatalogAccess>, interactions: Arc<dyn InteractionStore>) -> Self {
        Self { catalog, interactions }
    }

    pub async fn recommend(&self, seed: ProductId, limit: usize) -> Vec<Product> {
        fail_soft(RecommendationKind::Category, self.try_recommend(seed, limit).await)
    }

    pub async fn try_recommend(
        &self,
        seed: ProductId,
        limit: usize,
    ) -> StrategyResult<Vec<Product>> {
        let Some(category_id) =
            self.catalog.get_product(seed).await?.and_then(|product| product.category_id)
        else {
            return Ok(Vec::new());
        };

        let mut ranked = Vec::new();
        for product in self.catalog.get_products_by_category(category_id).await? {
            if product.id == seed || !product.is_eligible() {
                continue;
            }
            let rating = self.interactions.get_average_rating(product.id).await?;
            let views = self.interactions.get_view_count(product.id).await?;
            ranked.push(RankedProduct { product, rating, views });
        }

        ranked.sort_by(|a, b| {
            compare_ratings_desc(a.rating, b.rating)
                .then_with(|| b.views.cmp(&a.views))
                .then_with(|| a.product.id.cmp(&b.product.id))
        });

        Ok(ranked.into_iter().take(limit).map(|ranked| ranked.product).collect())
    }
}
