use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::fail_soft;
use crate::domain::product::Product;
use crate::recommendations::ports::{CatalogAccess, InteractionStore};
use crate::recommendations::{RecommendationKind, StrategyResult, TREND_WINDOW_DAYS};

/// All-time most viewed products that were also viewed inside the trend window.
pub struct TrendingStrategy {
    catalog: Arc<dyn CatalogAccess>,
    interactions: Arc<dyn InteractionStore>,
    trend_window: Duration,
}

impl TrendingStrategy {
    pub fn new(catalog: Arc<dyn CatalogAccess>, interactions: Arc<dyn InteractionStore>) -> Self {
        Self { catalog, interactions, trend_window: Duration::days(TREND_WINDOW_DAYS) }
    }

    pub fn with_window(mut self, trend_window: Duration) -> Self {
        self.trend_window = trend_window;
        self
    }

    pub async fn recommend(&self, limit: usize) -> Vec<Product> {
        self.recommend_at(limit, Utc::now()).await
    }

    pub async fn recommend_at(&self, limit: usize, now: DateTime<Utc>) -> Vec<Product> {
        fail_soft(RecommendationKind::Trending, self.try_recommend_at(limit, now).await)
    }

    pub async fn try_recommend_at(
        &self,
        limit: usize,
        now: DateTime<Utc>,
    ) -> StrategyResult<Vec<Product>> {
        let since = now - self.trend_window;
        let mut trending = Vec::new();

        for id in self.interactions.get_most_viewed_product_ids().await? {
            if trending.len() >= limit {
                break;
            }
            if self.interactions.get_view_count_since(id, since).await? == 0 {
                continue;
            }
            if let Some(product) = self.catalog.get_product(id).await? {
                if product.is_eligible() {
                    trending.push(product);
                }
            }
        }

        Ok(trending)
    }
}
