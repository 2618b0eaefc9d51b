use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{fail_soft, resolve_eligible};
use crate::domain::interaction::ViewerKey;
use crate::domain::product::{Product, ProductId};
use crate::recommendations::ports::{CatalogAccess, InteractionStore};
use crate::recommendations::{
    RecommendationKind, StrategyResult, MAX_RECOMMENDATIONS, RECENT_VIEW_SEEDS,
};

/// "Viewers of what you looked at also viewed": sums shared-viewer counts over
/// the viewer's recent products.
pub struct BrowsingHistoryStrategy {
    catalog: Arc<dyn CatalogAccess>,
    interactions: Arc<dyn InteractionStore>,
}

impl BrowsingHistoryStrategy {
    pub fn new(catalog: Arc<dyn CatalogAccess>, interactions: Arc<dyn InteractionStore>) -> Self {
        Self { catalog, interactions }
    }

    pub async fn recommend(&self, viewer: &ViewerKey) -> Vec<Product> {
        fail_soft(RecommendationKind::BrowsingHistory, self.try_recommend(viewer).await)
    }

    pub async fn try_recommend(&self, viewer: &ViewerKey) -> StrategyResult<Vec<Product>> {
        let recent =
            self.interactions.get_recently_viewed_product_ids(viewer, RECENT_VIEW_SEEDS).await?;
        if recent.is_empty() {
            return Ok(Vec::new());
        }

        let already_seen: HashSet<ProductId> = recent.iter().copied().collect();
        let mut scores: HashMap<ProductId, u64> = HashMap::new();
        for seed in &recent {
            for candidate in self.interactions.get_co_viewed_candidates(*seed).await? {
                if already_seen.contains(&candidate.product_id) {
                    continue;
                }
                *scores.entry(candidate.product_id).or_default() += u64::from(candidate.count);
            }
        }

        let mut ranked = scores.into_iter().collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        resolve_eligible(
            self.catalog.as_ref(),
            ranked.into_iter().map(|(product_id, _)| product_id),
            MAX_RECOMMENDATIONS,
        )
        .await
    }
}
