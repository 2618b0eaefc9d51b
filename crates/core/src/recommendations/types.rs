//! Types for the recommendation engine

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{RecommendationConfig, MAX_RECOMMENDATION_LIMIT};
use crate::domain::interaction::ViewerKey;
use crate::domain::product::ProductId;
use crate::errors::DomainError;

/// Which heuristic (or the weighted mix) a caller asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationKind {
    /// Frequently bought together
    CoPurchase,
    /// Viewers of your recent products also viewed
    BrowsingHistory,
    /// Best rated in the same category
    Category,
    /// Well rated across categories
    RatingAffinity,
    /// Popular and viewed recently
    Trending,
    /// Same attributes, closest price
    Similar,
    /// The viewer's own recently viewed products
    RecentlyViewed,
    /// Weighted union of the product-seeded strategies
    Mixed,
}

impl RecommendationKind {
    pub const ALL: [RecommendationKind; 8] = [
        Self::CoPurchase,
        Self::BrowsingHistory,
        Self::Category,
        Self::RatingAffinity,
        Self::Trending,
        Self::Similar,
        Self::RecentlyViewed,
        Self::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoPurchase => "co-purchase",
            Self::BrowsingHistory => "browsing-history",
            Self::Category => "category",
            Self::RatingAffinity => "rating-affinity",
            Self::Trending => "trending",
            Self::Similar => "similar",
            Self::RecentlyViewed => "recently-viewed",
            Self::Mixed => "mixed",
        }
    }

    pub fn requires_product(&self) -> bool {
        matches!(
            self,
            Self::CoPurchase | Self::Category | Self::RatingAffinity | Self::Similar | Self::Mixed
        )
    }

    pub fn requires_viewer(&self) -> bool {
        matches!(self, Self::BrowsingHistory | Self::RecentlyViewed)
    }
}

impl fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendationKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| DomainError::InvalidRecommendationKind(value.to_string()))
    }
}

/// Request for recommendations
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub kind: RecommendationKind,
    /// Product the shopper is looking at
    pub product_id: Option<ProductId>,
    /// Who is browsing
    pub viewer: Option<ViewerKey>,
    /// Falls back to the configured default when unset
    pub limit: Option<usize>,
}

impl RecommendationRequest {
    pub fn new(kind: RecommendationKind) -> Self {
        Self { kind, product_id: None, viewer: None, limit: None }
    }

    pub fn with_product(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_viewer(mut self, viewer: ViewerKey) -> Self {
        self.viewer = Some(viewer);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Cache key component: product id, viewer key, both for mixed, or `all`.
    /// `None` when the kind's required input is missing.
    pub fn primary_key(&self) -> Option<String> {
        match self.kind {
            RecommendationKind::Trending => Some("all".to_string()),
            RecommendationKind::BrowsingHistory | RecommendationKind::RecentlyViewed => {
                self.viewer.as_ref().map(ToString::to_string)
            }
            RecommendationKind::Mixed => self.product_id.map(|product_id| match &self.viewer {
                Some(viewer) => format!("{product_id}:{viewer}"),
                None => format!("{product_id}:-"),
            }),
            RecommendationKind::CoPurchase
            | RecommendationKind::Category
            | RecommendationKind::RatingAffinity
            | RecommendationKind::Similar => self.product_id.map(|id| id.to_string()),
        }
    }
}

/// Runtime knobs for the engine
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSettings {
    pub default_limit: usize,
    pub strategy_timeout: Duration,
    pub cache_ttl: Duration,
    pub trend_window: chrono::Duration,
}

impl RecommendationSettings {
    pub fn from_config(config: &RecommendationConfig) -> Self {
        Self {
            default_limit: config.default_limit,
            strategy_timeout: config.strategy_timeout(),
            cache_ttl: config.cache_ttl(),
            trend_window: chrono::Duration::days(config.trend_window_days),
        }
    }

    /// Requested limit, defaulted and capped at `MAX_RECOMMENDATION_LIMIT`.
    /// Zero stays zero.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(MAX_RECOMMENDATION_LIMIT)
    }
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            default_limit: super::MAX_RECOMMENDATIONS,
            strategy_timeout: Duration::from_secs(2),
            cache_ttl: Duration::from_secs(600),
            trend_window: chrono::Duration::days(super::TREND_WINDOW_DAYS),
        }
    }
}
