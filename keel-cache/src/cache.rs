//! In-memory TTL cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use keel_core::error::Result;
use keel_core::traits::ConfigCache;

/// Cache entry with optional TTL.
#[derive(Clone)]
struct CacheEntry {
    value: String,
    inserted_at: Instant,
    /// `None` never expires
    ttl: Option<Duration>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.ttl.is_some_and(|ttl| self.inserted_at.elapsed() > ttl)
    }
}

/// Cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub max_entries: usize,
    /// Whether to drop expired entries before evicting live ones
    pub auto_cleanup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: keel_core::DEFAULT_CACHE_MAX_ENTRIES,
            auto_cleanup: true,
        }
    }
}

/// In-memory cache for serialized company snapshots.
///
/// Thread-safe; each operation is atomic per key.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    config: CacheConfig,
}

impl MemoryCache {
    /// Creates a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Returns a live value without going through the async trait.
    pub fn peek(&self, key: &str) -> Option<String> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|e| !e.is_expired())
            .map(|e| e.value.clone())
    }

    /// Stores a value. A zero `ttl` means the entry never expires.
    pub fn insert(&self, key: &str, value: String, ttl: Duration) {
        let mut entries = self.entries.write();

        if !entries.contains_key(key) {
            if self.config.auto_cleanup && entries.len() >= self.config.max_entries {
                entries.retain(|_, e| !e.is_expired());
            }
            if entries.len() >= self.config.max_entries {
                if let Some(oldest_key) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.inserted_at)
                    .map(|(k, _)| k.clone())
                {
                    debug!(key = %oldest_key, "Evicting oldest cache entry");
                    entries.remove(&oldest_key);
                }
            }
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                ttl: (!ttl.is_zero()).then_some(ttl),
            },
        );
    }

    /// Removes an entry if present.
    pub fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }

    /// Clears all cached entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Removes all expired entries.
    pub fn cleanup_expired(&self) {
        self.entries.write().retain(|_, e| !e.is_expired());
    }

    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let expired = entries.values().filter(|e| e.is_expired()).count();
        CacheStats {
            total_entries: entries.len(),
            expired_entries: expired,
            valid_entries: entries.len().saturating_sub(expired),
            capacity: self.config.max_entries,
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigCache for MemoryCache {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.insert(key, value, ttl);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.peek(key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.remove(key);
        Ok(())
    }
}

/// Cache statistics.
#[derive(Clone, Debug, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub valid_entries: usize,
    pub capacity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOREVER: Duration = Duration::ZERO;

    #[tokio::test]
    async fn test_cache_set_get() {
        let cache = MemoryCache::new();
        cache.set("config:acme", "{}".into(), FOREVER).await.unwrap();
        assert_eq!(cache.get("config:acme").await.unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let cache = MemoryCache::new();
        assert!(cache.get("config:nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_noop() {
        let cache = MemoryCache::new();
        cache.delete("config:nobody").await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_cache_delete() {
        let cache = MemoryCache::new();
        cache.set("config:acme", "a".into(), FOREVER).await.unwrap();
        cache.delete("config:acme").await.unwrap();
        assert!(cache.get("config:acme").await.unwrap().is_none());
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache.insert("config:acme", "a".into(), FOREVER);
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.peek("config:acme").is_some());
    }

    #[test]
    fn test_cache_ttl_expiration() {
        let cache = MemoryCache::new();
        cache.insert("config:acme", "a".into(), Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.peek("config:acme").is_none());
    }

    #[test]
    fn test_overwrite_resets_value() {
        let cache = MemoryCache::new();
        cache.insert("config:acme", "old".into(), FOREVER);
        cache.insert("config:acme", "new".into(), FOREVER);
        assert_eq!(cache.peek("config:acme").as_deref(), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_capacity_eviction() {
        let cache = MemoryCache::with_config(CacheConfig {
            max_entries: 2,
            auto_cleanup: true,
        });
        cache.insert("config:a", "1".into(), FOREVER);
        cache.insert("config:b", "2".into(), FOREVER);
        cache.insert("config:c", "3".into(), FOREVER);
        assert_eq!(cache.len(), 2);
        assert!(cache.peek("config:c").is_some());
    }

    #[test]
    fn test_cache_stats_and_cleanup() {
        let cache = MemoryCache::new();
        cache.insert("config:a", "1".into(), Duration::from_millis(1));
        cache.insert("config:b", "2".into(), FOREVER);
        std::thread::sleep(Duration::from_millis(10));

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_entries, 1);

        cache.cleanup_expired();
        assert_eq!(cache.len(), 1);
        assert!(cache.peek("config:b").is_some());

        cache.clear();
        assert!(cache.is_empty());
    }
}
