use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::types::RecommendationKind;
use crate::domain::product::Product;

/// Memoization key: (strategy, product/viewer key, limit).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub strategy: RecommendationKind,
    pub primary_key: String,
    pub limit: usize,
}

impl CacheKey {
    pub fn new(strategy: RecommendationKind, primary_key: impl Into<String>, limit: usize) -> Self {
        Self { strategy, primary_key: primary_key.into(), limit }
    }
}

#[async_trait]
pub trait RecommendationCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Option<Vec<Product>>;
    async fn put(&self, key: CacheKey, products: Vec<Product>, ttl: Duration);
    async fn invalidate_all(&self);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    products: Vec<Product>,
    expires_at: Instant,
}

/// TTL cache shared by every engine call. Entries are replaced wholesale on
/// write, so a racing duplicate computation just overwrites an equal value.
/// Expired entries are dropped on a missed read and swept on every write.
#[derive(Default)]
pub struct InMemoryRecommendationCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl InMemoryRecommendationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl RecommendationCache for InMemoryRecommendationCache {
    async fn get(&self, key: &CacheKey) -> Option<Vec<Product>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.products.clone());
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        let now = Instant::now();
        if entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
            entries.remove(key);
        }
        None
    }

    async fn put(&self, key: CacheKey, products: Vec<Product>, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(key, CacheEntry { products, expires_at: now + ttl });
    }

    async fn invalidate_all(&self) {
        self.entries.write().await.clear();
    }
}

/// Used when caching is switched off in configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRecommendationCache;

#[async_trait]
impl RecommendationCache for NoopRecommendationCache {
    async fn get(&self, _key: &CacheKey) -> Option<Vec<Product>> {
        None
    }

    async fn put(&self, _key: CacheKey, _products: Vec<Product>, _ttl: Duration) {}

    async fn invalidate_all(&self) {}
}
