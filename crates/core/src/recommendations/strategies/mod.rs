//! One module per recommendation heuristic.
//!
//! Each strategy exposes `try_recommend`, which surfaces data-access errors, and
//! `recommend`, which logs them and degrades to an empty list.

mod browsing_history;
mod category_fallback;
mod co_purchase;
mod rating_affinity;
mod recently_viewed;
mod similarity;
mod trending;

use std::cmp::Ordering;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

pub use browsing_history::BrowsingHistoryStrategy;
pub use category_fallback::CategoryFallbackStrategy;
pub use co_purchase::CoPurchaseStrategy;
pub use rating_affinity::RatingAffinityStrategy;
pub use recently_viewed::RecentlyViewedStrategy;
pub use similarity::SimilarityStrategy;
pub use trending::TrendingStrategy;

use super::ports::{CatalogAccess, DataAccessError};
use super::types::RecommendationKind;
use super::StrategyResult;
use crate::domain::product::{Product, ProductId};

/// Swallows a strategy failure into an empty contribution.
pub(crate) fn fail_soft(
    kind: RecommendationKind,
    result: StrategyResult<Vec<Product>>,
) -> Vec<Product> {
    match result {
        Ok(products) => products,
        Err(error) => {
            let event_name = if matches!(error, DataAccessError::Timeout(_)) {
                "recommend.strategy.timeout"
            } else {
                "recommend.strategy.failed"
            };
            warn!(
                event_name,
                strategy = kind.as_str(),
                error = %error,
                "recommendation strategy degraded to empty result"
            );
            Vec::new()
        }
    }
}

/// Runs a strategy under a deadline; a timeout counts as a data-access failure.
pub(crate) async fn guarded<F>(
    kind: RecommendationKind,
    timeout: Duration,
    call: F,
) -> Vec<Product>
where
    F: Future<Output = StrategyResult<Vec<Product>>>,
{
    let result = match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(DataAccessError::Timeout(timeout)),
    };
    fail_soft(kind, result)
}

/// Resolves ids in order, skipping unknown, ineligible and repeated products,
/// until `cap` products are collected.
pub(crate) async fn resolve_eligible<I>(
    catalog: &dyn CatalogAccess,
    ids: I,
    cap: usize,
) -> StrategyResult<Vec<Product>>
where
    I: IntoIterator<Item = ProductId>,
{
    let mut resolved = Vec::new();
    let mut seen = HashSet::new();
    for id in ids {
        if resolved.len() >= cap {
            break;
        }
        if !seen.insert(id) {
            continue;
        }
        if let Some(product) = catalog.get_product(id).await? {
            if product.is_eligible() {
                resolved.push(product);
            }
        }
    }
    Ok(resolved)
}

/// Descending by rating with absent ratings last.
pub(crate) fn compare_ratings_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    let a = a.unwrap_or(f64::NEG_INFINITY);
    let b = b.unwrap_or(f64::NEG_INFINITY);
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
