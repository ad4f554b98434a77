//! In-memory cache store with per-entry TTLs.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::CacheStore;

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Process-local [`CacheStore`] backed by a concurrent map.
///
/// Expired entries are dropped lazily on read; there is no background
/// sweeper. Suitable for a single-process deployment and for tests.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries. Test/diagnostic helper.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|e| e.value().expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let entry = self.entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u64) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + Duration::from_secs(ttl_secs),
            },
        );
    }

    async fn del(&self, key: &str) {
        self.entries.remove(key);
    }

    async fn del_prefix(&self, prefix: &str) {
        self.entries.retain(|key, _| !key.starts_with(prefix));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();
        cache.set("price:AAPL", "175.5".to_string(), 60).await;
        assert_eq!(cache.get("price:AAPL").await.as_deref(), Some("175.5"));
        assert_eq!(cache.get("price:MSFT").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_not_returned() {
        let cache = MemoryCache::new();
        cache.set("k", "v".to_string(), 0).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_del_prefix() {
        let cache = MemoryCache::new();
        cache.set("holdings:u1", "[]".to_string(), 60).await;
        cache.set("holdings:u1:p1", "[]".to_string(), 60).await;
        cache.set("portfolios:u1", "[]".to_string(), 60).await;

        cache.del_prefix("holdings:").await;

        assert_eq!(cache.get("holdings:u1").await, None);
        assert_eq!(cache.get("holdings:u1:p1").await, None);
        assert!(cache.get("portfolios:u1").await.is_some());
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let cache = MemoryCache::new();
        cache.set("k", "first".to_string(), 60).await;
        cache.set("k", "second".to_string(), 60).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("second"));
    }
}
