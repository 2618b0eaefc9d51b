//! Grouped-count aggregates over the raw interaction read model.
//!
//! These mirror the SQL the persistence layer runs so the in-memory store and
//! the database agree on ordering: count descending, then product id ascending.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::domain::interaction::{
    CandidateCount, CoPurchaseFact, OrderId, Review, ViewEvent, ViewerKey,
};
use crate::domain::product::ProductId;

fn sort_by_count(counts: HashMap<ProductId, u32>) -> Vec<CandidateCount> {
    let mut ranked = counts
        .into_iter()
        .map(|(product_id, count)| CandidateCount::new(product_id, count))
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.product_id.cmp(&b.product_id)));
    ranked
}

/// Number of distinct orders each other product shares with `seed`.
pub fn co_purchase_counts(facts: &[CoPurchaseFact], seed: ProductId) -> Vec<CandidateCount> {
    let seed_orders: HashSet<OrderId> =
        facts.iter().filter(|fact| fact.product_id == seed).map(|fact| fact.order_id).collect();
    if seed_orders.is_empty() {
        return Vec::new();
    }

    let pairs: HashSet<(OrderId, ProductId)> = facts
        .iter()
        .filter(|fact| fact.product_id != seed && seed_orders.contains(&fact.order_id))
        .map(|fact| (fact.order_id, fact.product_id))
        .collect();

    let mut counts: HashMap<ProductId, u32> = HashMap::new();
    for (_, product_id) in pairs {
        *counts.entry(product_id).or_default() += 1;
    }

    sort_by_count(counts)
}

/// Distinct products the viewer looked at, latest view first.
pub fn recently_viewed(events: &[ViewEvent], viewer: &ViewerKey, limit: usize) -> Vec<ProductId> {
    let mut latest: HashMap<ProductId, DateTime<Utc>> = HashMap::new();
    for event in events.iter().filter(|event| &event.viewer == viewer) {
        latest
            .entry(event.product_id)
            .and_modify(|seen| *seen = (*seen).max(event.viewed_at))
            .or_insert(event.viewed_at);
    }

    let mut ordered = latest.into_iter().collect::<Vec<_>>();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ordered.into_iter().take(limit).map(|(product_id, _)| product_id).collect()
}

/// For every viewer of `seed`, the products they viewed at or after their first
/// view of `seed`, counted once per viewer.
pub fn co_view_counts(events: &[ViewEvent], seed: ProductId) -> Vec<CandidateCount> {
    let mut first_seed_view: HashMap<&ViewerKey, DateTime<Utc>> = HashMap::new();
    for event in events.iter().filter(|event| event.product_id == seed) {
        first_seed_view
            .entry(&event.viewer)
            .and_modify(|first| *first = (*first).min(event.viewed_at))
            .or_insert(event.viewed_at);
    }

    let mut viewers: HashMap<ProductId, HashSet<&ViewerKey>> = HashMap::new();
    for event in events.iter().filter(|event| event.product_id != seed) {
        let Some(first) = first_seed_view.get(&event.viewer) else {
            continue;
        };
        if event.viewed_at >= *first {
            viewers.entry(event.product_id).or_default().insert(&event.viewer);
        }
    }

    sort_by_count(
        viewers
            .into_iter()
            .map(|(product_id, viewers)| (product_id, viewers.len() as u32))
            .collect(),
    )
}

pub fn average_rating(reviews: &[Review], product_id: ProductId) -> Option<f64> {
    let ratings = reviews
        .iter()
        .filter(|review| review.product_id == product_id)
        .map(|review| f64::from(review.rating))
        .collect::<Vec<_>>();
    if ratings.is_empty() {
        return None;
    }
    Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
}

pub fn view_count_since(
    events: &[ViewEvent],
    product_id: ProductId,
    since: Option<DateTime<Utc>>,
) -> u64 {
    events
        .iter()
        .filter(|event| event.product_id == product_id)
        .filter(|event| since.map_or(true, |since| event.viewed_at >= since))
        .count() as u64
}

pub fn most_viewed(events: &[ViewEvent]) -> Vec<ProductId> {
    let mut counts: HashMap<ProductId, u32> = HashMap::new();
    for event in events {
        *counts.entry(event.product_id).or_default() += 1;
    }
    sort_by_count(counts).into_iter().map(|candidate| candidate.product_id).collect()
}
