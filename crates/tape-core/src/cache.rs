//! Cache trait for storing fetched responses.
//!
//! This module defines the [`DataCache`] trait. Entries are keyed by
//! [`CacheKey`] and hold a serialized payload together with the instant it was
//! stored. Freshness is decided by the caller against its own clock, so a stale
//! entry stays readable as a fallback until it is overwritten or invalidated.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// Identifies one cached response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    /// Kind of data, e.g. `bars` or `movers`.
    pub source: String,
    /// Parameters that distinguish responses of the same kind, e.g. `AAPL:1M`.
    pub resource: String,
}

impl CacheKey {
    /// Creates a key.
    #[must_use]
    pub fn new(source: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            resource: resource.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.resource)
    }
}

/// A cached payload with its insertion time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    /// Serialized response.
    pub payload: String,
    /// When the payload was stored.
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stored at `cached_at`.
    #[must_use]
    pub const fn new(payload: String, cached_at: DateTime<Utc>) -> Self {
        Self { payload, cached_at }
    }

    /// Age of the entry at `now`. Zero if `now` precedes insertion.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        (now - self.cached_at).max(TimeDelta::zero())
    }

    /// An entry is fresh while its age is strictly below `ttl`.
    #[must_use]
    pub fn is_stale(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        self.age(now) >= ttl
    }
}

/// Trait for caching fetched responses.
///
/// Implementations can store data in various backends to avoid repeated API
/// calls. Reads never filter by age; see [`CacheEntry::is_stale`].
#[async_trait]
pub trait DataCache: Send + Sync {
    /// Retrieves the entry stored under `key`.
    ///
    /// Returns `Ok(Some(entry))` if cached, `Ok(None)` if not cached.
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;

    /// Stores `payload` under `key`, replacing any previous entry and
    /// stamping it with the cache's current time.
    async fn put(&self, key: &CacheKey, payload: String) -> Result<()>;

    /// Removes entries older than the specified TTL.
    ///
    /// Returns the number of entries invalidated.
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize>;

    /// Clears all cached data.
    async fn clear(&self) -> Result<()>;
}
