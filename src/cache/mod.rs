//! Aggregate result cache.
//!
//! Results are keyed by `namespace:user:filters_hash` and expire after a
//! fixed TTL. Entries are advisory: a miss, an expired entry or an entry
//! that no longer deserializes just means the value is recomputed.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::models::{StatsFilters, UserId};

/// Default lifetime of a cached aggregate.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// Key-value cache contract.
#[async_trait]
pub trait StatsCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;

    async fn set(&self, key: &str, value: Value, ttl: Duration);

    /// Remove every key starting with `prefix`, returning how many were removed.
    async fn invalidate_prefix(&self, prefix: &str) -> usize;
}

/// Cache key for an aggregate of `namespace` for `user` under `filters`.
pub fn cache_key(namespace: &str, user_id: &UserId, filters: &StatsFilters) -> String {
    format!("{}{}", user_prefix(namespace, user_id), filters.cache_hash())
}

/// Prefix shared by every key of `namespace` for `user`.
pub fn user_prefix(namespace: &str, user_id: &UserId) -> String {
    format!("{}:{}:", namespace, user_id)
}

/// Typed read; a value that fails to deserialize counts as a miss.
pub async fn get_typed<T: DeserializeOwned>(cache: &dyn StatsCache, key: &str) -> Option<T> {
    let value = cache.get(key).await?;
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Discarding unreadable cache entry {}: {}", key, e);
            None
        }
    }
}

/// Typed write; a value that fails to serialize is not cached.
pub async fn set_typed<T: Serialize>(cache: &dyn StatsCache, key: &str, value: &T, ttl: Duration) {
    match serde_json::to_value(value) {
        Ok(v) => cache.set(key, v, ttl).await,
        Err(e) => warn!("Not caching {}: {}", key, e),
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// In-process cache. Expired entries are evicted when read.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl StatsCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => {
                    debug!("Cache miss: {}", key);
                    return None;
                }
                Some(entry) if entry.expires_at > Instant::now() => {
                    debug!("Cache hit: {}", key);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|e| e.expires_at <= Instant::now())
        {
            entries.remove(key);
            debug!("Cache expired: {}", key);
        }
        None
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        let removed = before - entries.len();
        debug!("Invalidated {} cache entries under {}", removed, prefix);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryCache::new();
        cache.set("aim:u1:abc", json!({"accuracy": 25.0}), DEFAULT_TTL).await;

        let value = cache.get("aim:u1:abc").await.unwrap();
        assert_eq!(value["accuracy"], 25.0);
        assert!(cache.get("aim:u2:abc").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss_and_evicted() {
        let cache = MemoryCache::new();
        cache
            .set("aim:u1:abc", json!(1), Duration::from_millis(10))
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(cache.get("aim:u1:abc").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalidate_prefix() {
        let cache = MemoryCache::new();
        cache.set("aim:u1:a", json!(1), DEFAULT_TTL).await;
        cache.set("aim:u1:b", json!(2), DEFAULT_TTL).await;
        cache.set("aim:u10:a", json!(3), DEFAULT_TTL).await;
        cache.set("maps:u1:a", json!(4), DEFAULT_TTL).await;

        let removed = cache.invalidate_prefix(&user_prefix("aim", &"u1".into())).await;
        assert_eq!(removed, 2);
        assert!(cache.get("aim:u10:a").await.is_some());
        assert!(cache.get("maps:u1:a").await.is_some());
    }

    #[tokio::test]
    async fn test_typed_round_trip_and_bad_shape() {
        let cache = MemoryCache::new();
        set_typed(&cache, "k", &vec![1u32, 2, 3], DEFAULT_TTL).await;
        let back: Option<Vec<u32>> = get_typed(&cache, "k").await;
        assert_eq!(back, Some(vec![1, 2, 3]));

        let wrong: Option<String> = get_typed(&cache, "k").await;
        assert!(wrong.is_none());
    }

    #[test]
    fn test_cache_key_depends_on_filters() {
        let user: UserId = "u1".into();
        let a = cache_key("aim", &user, &StatsFilters::default());
        let b = cache_key("aim", &user, &StatsFilters::default().with_map("de_nuke"));
        assert_ne!(a, b);
        assert!(a.starts_with("aim:u1:"));
        assert_eq!(a, cache_key("aim", &user, &StatsFilters::default()));
    }
}
