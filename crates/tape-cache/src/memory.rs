//! In-memory cache implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tape_core::{CacheEntry, CacheKey, Clock, DataCache, Result, SystemClock};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Process-wide in-memory response cache.
///
/// Entries live in a `RwLock`-protected `HashMap` and are lost when the cache
/// is dropped. Insertion times come from the injected [`Clock`], so expiry can
/// be driven deterministically in tests.
#[derive(Debug)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCache {
    /// Create a new empty in-memory cache on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a new empty in-memory cache stamping entries with `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of stored entries, fresh or stale.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl DataCache for InMemoryCache {
    #[instrument(skip(self), fields(key = %key))]
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let cache = self.entries.read().await;
        match cache.get(key) {
            Some(entry) => {
                debug!(cached_at = %entry.cached_at, "Cache hit");
                Ok(Some(entry.clone()))
            }
            None => {
                debug!("Cache miss");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, payload), fields(key = %key, bytes = payload.len()))]
    async fn put(&self, key: &CacheKey, payload: String) -> Result<()> {
        let entry = CacheEntry::new(payload, self.clock.now());
        self.entries.write().await.insert(key.clone(), entry);
        debug!("Cached response");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let now = self.clock.now();
        let mut cache = self.entries.write().await;
        let before = cache.len();
        cache.retain(|_, entry| !entry.is_stale(ttl, now));
        let removed = before - cache.len();

        if removed > 0 {
            debug!("Invalidated {} stale cache entries", removed);
        }

        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        debug!("Cleared all cache entries");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};
    use tape_core::ManualClock;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 12, 14, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_memory_cache_round_trip() {
        let clock = clock();
        let cache = InMemoryCache::with_clock(clock.clone());
        let key = CacheKey::new("bars", "AAPL:1M");

        // Initially no data
        assert!(cache.get(&key).await.unwrap().is_none());

        cache.put(&key, "[1,2,3]".to_string()).await.unwrap();
        let entry = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(entry.payload, "[1,2,3]");
        assert_eq!(entry.cached_at, clock.now());

        // Other keys are unaffected
        assert!(cache.get(&CacheKey::new("bars", "AAPL:1Y")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_cache_put_overwrites() {
        let clock = clock();
        let cache = InMemoryCache::with_clock(clock.clone());
        let key = CacheKey::new("movers", "top5");

        cache.put(&key, "old".to_string()).await.unwrap();
        clock.advance(TimeDelta::minutes(10));
        cache.put(&key, "new".to_string()).await.unwrap();

        let entry = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(entry.payload, "new");
        assert_eq!(entry.cached_at, clock.now());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_cache_stale_entries_stay_readable() {
        let clock = clock();
        let cache = InMemoryCache::with_clock(clock.clone());
        let key = CacheKey::new("sectors", "key");
        let ttl = Duration::from_secs(300);

        cache.put(&key, "x".to_string()).await.unwrap();
        clock.advance(TimeDelta::seconds(301));

        let entry = cache.get(&key).await.unwrap().unwrap();
        assert!(entry.is_stale(ttl, clock.now()));
    }

    #[tokio::test]
    async fn test_memory_cache_invalidate_stale() {
        let clock = clock();
        let cache = InMemoryCache::with_clock(clock.clone());
        let ttl = Duration::from_secs(300);

        cache.put(&CacheKey::new("a", "1"), "old".to_string()).await.unwrap();
        clock.advance(TimeDelta::seconds(200));
        cache.put(&CacheKey::new("a", "2"), "new".to_string()).await.unwrap();
        clock.advance(TimeDelta::seconds(150));

        assert_eq!(cache.invalidate_stale(ttl).await.unwrap(), 1);
        assert!(cache.get(&CacheKey::new("a", "1")).await.unwrap().is_none());
        assert!(cache.get(&CacheKey::new("a", "2")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_memory_cache_clear() {
        let cache = InMemoryCache::new();
        cache.put(&CacheKey::new("a", "1"), "x".to_string()).await.unwrap();

        cache.clear().await.unwrap();

        assert!(cache.is_empty().await);
    }
}
