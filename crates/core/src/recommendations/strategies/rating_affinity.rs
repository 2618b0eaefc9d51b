use std::sync::Arc;

use super::{compare_ratings_desc, fail_soft};
use crate::domain::product::{Product, ProductId};
use crate::recommendations::ports::{CatalogAccess, InteractionStore};
use crate::recommendations::{RecommendationKind, StrategyResult, MIN_RATING, RATING_BAND};

/// Well rated products near the seed's rating, in any category.
pub struct RatingAffinityStrategy {
    catalog: Arc<dyn CatalogAccess>,
    interactions: Arc<dyn InteractionStore>,
}

impl RatingAffinityStrategy {
    pub fn new(catalog: Arc<dyn CatalogAccess>, interactions: Arc<dyn InteractionStore>) -> Self {
        Self { catalog, interactions }
    }

    pub async fn recommend(&self, seed: ProductId, limit: usize) -> Vec<Product> {
        fail_soft(RecommendationKind::RatingAffinity, self.try_recommend(seed, limit).await)
    }

    pub async fn try_recommend(
        &self,
        seed: ProductId,
        limit: usize,
    ) -> StrategyResult<Vec<Product>> {
        let Some(seed_product) = self.catalog.get_product(seed).await? else {
            return Ok(Vec::new());
        };
        let seed_rating = match self.interactions.get_average_rating(seed).await? {
            Some(rating) if rating >= MIN_RATING => rating,
            _ => return Ok(Vec::new()),
        };

        let mut ranked = Vec::new();
        for product in self.catalog.list_active_products().await? {
            if product.id == seed || !product.is_eligible() {
                continue;
            }
            let rating = self.interactions.get_average_rating(product.id).await?;
            let same_category = seed_product.category_id.is_some()
                && product.category_id == seed_product.category_id;
            // An unrated product never meets the rating clause.
            let rated_nearby = rating.is_some_and(|rating| {
                rating >= MIN_RATING && (rating - seed_rating).abs() <= RATING_BAND
            });
            if same_category || rated_nearby {
                ranked.push((product, rating));
            }
        }

        ranked.sort_by(|a, b| compare_ratings_desc(a.1, b.1).then_with(|| a.0.id.cmp(&b.0.id)));
        Ok(ranked.into_iter().take(limit).map(|(product, _)| product).collect())
    }
}
