//! Cache store abstraction and the default in-memory implementation.
//!
//! The gateway treats the cache as a redis-shaped key/value store holding
//! JSON strings. Concurrent writers racing on the same key are tolerated:
//! writes are idempotent and last-writer-wins is an acceptable outcome.

mod memory;

pub use memory::MemoryCache;

use async_trait::async_trait;

/// Key/value store with per-entry TTLs.
///
/// Implementations must be safe to share across tasks. Values are JSON
/// strings so an external store (redis, sqlite, ...) can be dropped in
/// without changing the gateway.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store a value for `ttl_secs` seconds.
    async fn set(&self, key: &str, value: String, ttl_secs: u64);

    /// Remove a single key.
    async fn del(&self, key: &str);

    /// Remove every key starting with `prefix` (pattern invalidation).
    async fn del_prefix(&self, prefix: &str);
}
