//! Caching layer for geocoding lookups.
//!
//! Addresses are normalized (trimmed, lowercased) before lookup so that
//! "Union Sq" and " union sq" share an entry. Only successful lookups are
//! cached; a failed geocode is retried on the next attempt.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::capabilities::{GeocodeError, Geocoder};
use crate::domain::Coordinate;

/// Configuration for the geocode cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            max_capacity: 1000,
        }
    }
}

impl CacheConfig {
    /// Set a custom TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the maximum number of entries.
    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }
}

/// Geocoder with caching.
///
/// Wraps any `Geocoder` and caches resolved coordinates by address.
pub struct CachedGeocoder<G> {
    inner: G,
    cache: MokaCache<String, Coordinate>,
}

impl<G: Geocoder> CachedGeocoder<G> {
    /// Create a new cached geocoder.
    pub fn new(inner: G, config: &CacheConfig) -> Self {
        let cache = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, cache }
    }

    /// Access the wrapped geocoder.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Get cache statistics.
    pub fn cache_entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}

#[async_trait]
impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let key = address.trim().to_lowercase();

        if let Some(cached) = self.cache.get(&key).await {
            debug!(%address, "geocode cache hit");
            return Ok(cached);
        }

        let coordinate = self.inner.geocode(address).await?;
        self.cache.insert(key, coordinate).await;
        Ok(coordinate)
    }
}
