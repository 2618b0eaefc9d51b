use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::ports::{CatalogAccess, InteractionStore};
use super::scoring::{MergeWeights, ScoreBoard};
use super::strategies::{
    guarded, BrowsingHistoryStrategy, CategoryFallbackStrategy, CoPurchaseStrategy,
    RatingAffinityStrategy, SimilarityStrategy,
};
use super::types::RecommendationKind;
use super::MAX_RECOMMENDATIONS;
use crate::domain::interaction::ViewerKey;
use crate::domain::product::{Product, ProductId};

/// Weighted union behind the `mixed` recommendation.
///
/// The four independent strategies run concurrently; category fallback only
/// tops up the board once their distinct count is known. Every contribution is
/// individually guarded, so the merge itself cannot fail.
pub struct RecommendationMerger {
    co_purchase: CoPurchaseStrategy,
    rating_affinity: RatingAffinityStrategy,
    browsing_history: BrowsingHistoryStrategy,
    similarity: SimilarityStrategy,
    category_fallback: CategoryFallbackStrategy,
    weights: MergeWeights,
    strategy_timeout: Duration,
}

impl RecommendationMerger {
    pub fn new(catalog: Arc<dyn CatalogAccess>, interactions: Arc<dyn InteractionStore>) -> Self {
        Self {
            co_purchase: CoPurchaseStrategy::new(catalog.clone(), interactions.clone()),
            rating_affinity: RatingAffinityStrategy::new(catalog.clone(), interactions.clone()),
            browsing_history: BrowsingHistoryStrategy::new(catalog.clone(), interactions.clone()),
            similarity: SimilarityStrategy::new(catalog.clone()),
            category_fallback: CategoryFallbackStrategy::new(catalog, interactions),
            weights: MergeWeights::default(),
            strategy_timeout: Duration::from_secs(2),
        }
    }

    pub fn with_weights(mut self, weights: MergeWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_strategy_timeout(mut self, strategy_timeout: Duration) -> Self {
        self.strategy_timeout = strategy_timeout;
        self
    }

    pub fn weights(&self) -> &MergeWeights {
        &self.weights
    }

    /// Top `limit` products of the merged board.
    pub async fn recommend(
        &self,
        seed: ProductId,
        viewer: Option<&ViewerKey>,
        limit: usize,
    ) -> Vec<Product> {
        self.merge(seed, viewer).await.into_top(limit)
    }

    /// Builds the full score board for a seed product.
    pub async fn merge(&self, seed: ProductId, viewer: Option<&ViewerKey>) -> ScoreBoard {
        let timeout = self.strategy_timeout;

        let browsing = async {
            match viewer {
                Some(viewer) => {
                    guarded(
                        RecommendationKind::BrowsingHistory,
                        timeout,
                        self.browsing_history.try_recommend(viewer),
                    )
                    .await
                }
                None => Vec::new(),
            }
        };

        let (co_purchased, rated, browsed, similar) = tokio::join!(
            guarded(RecommendationKind::CoPurchase, timeout, self.co_purchase.try_recommend(seed)),
            guarded(
                RecommendationKind::RatingAffinity,
                timeout,
                self.rating_affinity.try_recommend(seed, MAX_RECOMMENDATIONS),
            ),
            browsing,
            guarded(
                RecommendationKind::Similar,
                timeout,
                self.similarity.try_recommend(seed, MAX_RECOMMENDATIONS),
            ),
        );

        let mut board = ScoreBoard::new();
        board.add_all(co_purchased, self.weights.co_purchase);
        board.add_all(rated, self.weights.rating_affinity);
        board.add_all(browsed, self.weights.browsing_history);
        board.add_all(similar, self.weights.similarity);

        // Browsing history is not seeded by the product and may surface it.
        // Dropping it before the top-up keeps its slot for a real candidate.
        board.remove(seed);

        if board.len() < MAX_RECOMMENDATIONS {
            let remaining = MAX_RECOMMENDATIONS - board.len();
            let fallback = guarded(
                RecommendationKind::Category,
                timeout,
                self.category_fallback.try_recommend(seed, remaining),
            )
            .await;
            board.add_all(fallback, self.weights.category_fallback);
        }

        debug!(
            event_name = "recommend.mixed.merged",
            seed = %seed,
            candidates = board.len(),
            "mixed recommendation board built"
        );
        board
    }
}
