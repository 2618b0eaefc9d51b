//! Weighted score aggregation for mixed recommendations

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductId};

/// Points each strategy contributes per product it returns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeWeights {
    /// Default: 3.0
    pub co_purchase: f64,
    /// Default: 2.5
    pub rating_affinity: f64,
    /// Default: 2.0
    pub browsing_history: f64,
    /// Default: 1.5
    pub similarity: f64,
    /// Default: 1.0
    pub category_fallback: f64,
}

impl Default for MergeWeights {
    fn default() -> Self {
        super::DEFAULT_MERGE_WEIGHTS
    }
}

/// A product id with its accumulated score. Lives for one merge only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub product_id: ProductId,
    pub score: f64,
}

/// Additive score map that remembers first-seen order for tie-breaks.
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    entries: Vec<(Product, f64)>,
    index: HashMap<ProductId, usize>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, product: Product, weight: f64) {
        match self.index.get(&product.id) {
            Some(&position) => self.entries[position].1 += weight,
            None => {
                self.index.insert(product.id, self.entries.len());
                self.entries.push((product, weight));
            }
        }
    }

    pub fn add_all(&mut self, products: Vec<Product>, weight: f64) {
        for product in products {
            self.add(product, weight);
        }
    }

    pub fn remove(&mut self, product_id: ProductId) {
        if self.index.remove(&product_id).is_some() {
            self.entries.retain(|(product, _)| product.id != product_id);
            self.index = self
                .entries
                .iter()
                .enumerate()
                .map(|(position, (product, _))| (product.id, position))
                .collect();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn score_of(&self, product_id: ProductId) -> Option<f64> {
        self.index.get(&product_id).map(|&position| self.entries[position].1)
    }

    pub fn ranked(&self) -> Vec<ScoredCandidate> {
        self.sorted_entries()
            .into_iter()
            .map(|(product, score)| ScoredCandidate { product_id: product.id, score: *score })
            .collect()
    }

    pub fn into_top(self, limit: usize) -> Vec<Product> {
        let mut top = self.entries;
        sort_by_score(&mut top);
        top.into_iter().take(limit).map(|(product, _)| product).collect()
    }

    fn sorted_entries(&self) -> Vec<&(Product, f64)> {
        let mut sorted = self.entries.iter().collect::<Vec<_>>();
        sort_by_score(&mut sorted);
        sorted
    }
}

/// Score descending; the stable sort keeps insertion order among equal scores.
fn sort_by_score<E: std::borrow::Borrow<(Product, f64)>>(entries: &mut [E]) {
    entries.sort_by(|a, b| b.borrow().1.partial_cmp(&a.borrow().1).unwrap_or(Ordering::Equal));
}
