//! Product recommendation engine
//!
//! Independent scoring strategies (co-purchase, browsing history, category
//! fallback, rating affinity, trending, attribute similarity) combined by a
//! weighted merger into one ranked list. Every entry point is fail-soft: a
//! data-access failure degrades to an empty contribution, never an error.

pub mod aggregate;
mod cache;
mod engine;
mod memory;
mod merger;
mod ports;
mod scoring;
pub mod strategies;
mod types;

pub use cache::{
    CacheKey, InMemoryRecommendationCache, NoopRecommendationCache, RecommendationCache,
};
pub use engine::RecommendationEngine;
pub use memory::InMemoryStore;
pub use merger::RecommendationMerger;
pub use ports::{CatalogAccess, DataAccessError, InteractionStore};
pub use scoring::{MergeWeights, ScoreBoard, ScoredCandidate};
pub use strategies::{
    BrowsingHistoryStrategy, CategoryFallbackStrategy, CoPurchaseStrategy,
    RatingAffinityStrategy, RecentlyViewedStrategy, SimilarityStrategy, TrendingStrategy,
};
pub use types::*;

/// Result type for the data-access side of a strategy
pub type StrategyResult<T> = Result<T, DataAccessError>;

/// Default cap on every strategy's output
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Minimum number of shared orders before a co-purchase counts
pub const MIN_CO_PURCHASE: u32 = 2;

/// Average rating a product needs to take part in rating affinity
pub const MIN_RATING: f64 = 4.0;

/// Allowed distance between a candidate's and the seed's average rating
pub const RATING_BAND: f64 = 1.0;

/// How far back a view still counts as "trending"
pub const TREND_WINDOW_DAYS: i64 = 30;

/// How many of the viewer's own recent views seed browsing-history lookups
pub const RECENT_VIEW_SEEDS: usize = 10;

/// Fixed weights used by the mixed recommendation
pub const DEFAULT_MERGE_WEIGHTS: MergeWeights = MergeWeights {
    co_purchase: 3.0,
    rating_affinity: 2.5,
    browsing_history: 2.0,
    similarity: 1.5,
    category_fallback: 1.0,
};

#[cfg(test)]
pub(crate) mod testing;
