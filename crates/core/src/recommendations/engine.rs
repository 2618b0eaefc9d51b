use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::cache::{
    CacheKey, InMemoryRecommendationCache, NoopRecommendationCache, RecommendationCache,
};
use super::merger::RecommendationMerger;
use super::ports::{CatalogAccess, InteractionStore};
use super::strategies::{
    guarded, BrowsingHistoryStrategy, CategoryFallbackStrategy, CoPurchaseStrategy,
    RatingAffinityStrategy, RecentlyViewedStrategy, SimilarityStrategy, TrendingStrategy,
};
use super::types::{RecommendationKind, RecommendationRequest, RecommendationSettings};
use crate::config::RecommendationConfig;
use crate::domain::product::Product;

/// Entry point used by the CLI and HTTP surfaces.
pub struct RecommendationEngine {
    co_purchase: CoPurchaseStrategy,
    browsing_history: BrowsingHistoryStrategy,
    category_fallback: CategoryFallbackStrategy,
    rating_affinity: RatingAffinityStrategy,
    trending: TrendingStrategy,
    similarity: SimilarityStrategy,
    recently_viewed: RecentlyViewedStrategy,
    merger: RecommendationMerger,
    cache: Arc<dyn RecommendationCache>,
    settings: RecommendationSettings,
}

impl RecommendationEngine {
    pub fn new(
        catalog: Arc<dyn CatalogAccess>,
        interactions: Arc<dyn InteractionStore>,
        cache: Arc<dyn RecommendationCache>,
        settings: RecommendationSettings,
    ) -> Self {
        Self {
            co_purchase: CoPurchaseStrategy::new(catalog.clone(), interactions.clone()),
            browsing_history: BrowsingHistoryStrategy::new(catalog.clone(), interactions.clone()),
            category_fallback: CategoryFallbackStrategy::new(catalog.clone(), interactions.clone()),
            rating_affinity: RatingAffinityStrategy::new(catalog.clone(), interactions.clone()),
            trending: TrendingStrategy::new(catalog.clone(), interactions.clone())
                .with_window(settings.trend_window),
            similarity: SimilarityStrategy::new(catalog.clone()),
            recently_viewed: RecentlyViewedStrategy::new(catalog.clone(), interactions.clone()),
            merger: RecommendationMerger::new(catalog, interactions)
                .with_strategy_timeout(settings.strategy_timeout),
            cache,
            settings,
        }
    }

    /// Picks the cache implementation from `cache_enabled`.
    pub fn from_config(
        catalog: Arc<dyn CatalogAccess>,
        interactions: Arc<dyn InteractionStore>,
        config: &RecommendationConfig,
    ) -> Self {
        let cache: Arc<dyn RecommendationCache> = if config.cache_enabled {
            Arc::new(InMemoryRecommendationCache::new())
        } else {
            Arc::new(NoopRecommendationCache)
        };
        Self::new(catalog, interactions, cache, RecommendationSettings::from_config(config))
    }

    pub fn settings(&self) -> &RecommendationSettings {
        &self.settings
    }

    /// Never fails: missing inputs, data-access errors and timeouts all come
    /// back as an empty list.
    pub async fn recommend(&self, request: &RecommendationRequest) -> Vec<Product> {
        let limit = self.settings.effective_limit(request.limit);
        if limit == 0 {
            debug!(
                event_name = "recommend.request.zero_limit",
                kind = request.kind.as_str(),
                "zero limit requested"
            );
            return Vec::new();
        }
        let Some(primary_key) = request.primary_key() else {
            debug!(
                event_name = "recommend.request.incomplete",
                kind = request.kind.as_str(),
                requires_product = request.kind.requires_product(),
                requires_viewer = request.kind.requires_viewer(),
                "recommendation request is missing its seed input"
            );
            return Vec::new();
        };

        let key = CacheKey::new(request.kind, primary_key, limit);
        if let Some(products) = self.cache.get(&key).await {
            debug!(
                event_name = "recommend.cache.hit",
                kind = request.kind.as_str(),
                primary_key = %key.primary_key,
                limit,
                "served recommendations from cache"
            );
            return products;
        }

        let mut products = self.dispatch(request, limit).await;
        products.truncate(limit);

        info!(
            event_name = "recommend.completed",
            kind = request.kind.as_str(),
            primary_key = %key.primary_key,
            limit,
            returned = products.len(),
            "recommendations computed"
        );

        if !products.is_empty() {
            self.cache.put(key, products.clone(), self.settings.cache_ttl).await;
        }
        products
    }

    pub async fn invalidate_cache(&self) {
        self.cache.invalidate_all().await;
        info!(event_name = "recommend.cache.invalidated", "recommendation cache cleared");
    }

    async fn dispatch(&self, request: &RecommendationRequest, limit: usize) -> Vec<Product> {
        let kind = request.kind;
        let timeout = self.settings.strategy_timeout;
        match (kind, request.product_id, request.viewer.as_ref()) {
            (RecommendationKind::CoPurchase, Some(seed), _) => {
                guarded(kind, timeout, self.co_purchase.try_recommend(seed)).await
            }
            (RecommendationKind::BrowsingHistory, _, Some(viewer)) => {
                guarded(kind, timeout, self.browsing_history.try_recommend(viewer)).await
            }
            (RecommendationKind::Category, Some(seed), _) => {
                guarded(kind, timeout, self.category_fallback.try_recommend(seed, limit)).await
            }
            (RecommendationKind::RatingAffinity, Some(seed), _) => {
                guarded(kind, timeout, self.rating_affinity.try_recommend(seed, limit)).await
            }
            (RecommendationKind::Trending, _, _) => {
                guarded(kind, timeout, self.trending.try_recommend_at(limit, Utc::now())).await
            }
            (RecommendationKind::Similar, Some(seed), _) => {
                guarded(kind, timeout, self.similarity.try_recommend(seed, limit)).await
            }
            (RecommendationKind::RecentlyViewed, _, Some(viewer)) => {
                guarded(kind, timeout, self.recently_viewed.try_recommend(viewer, limit)).await
            }
            // Each sub-strategy carries its own deadline.
            (RecommendationKind::Mixed, Some(seed), viewer) => {
                self.merger.recommend(seed, viewer, limit).await
            }
            _ => Vec::new(),
        }
    }
}
