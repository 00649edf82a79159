//! Cache layer
//!
//! Public read paths (news lists, profile, settings, tourism catalog...)
//! are cached under namespaced keys such as `news:list:1`. Admin writes
//! invalidate whole namespaces with glob patterns, so the public site
//! picks up edits on the next request.
//!
//! ```rust,ignore
//! use banyuanyar::cache::{create_cache, CacheLayer};
//! use banyuanyar::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default())?;
//! cache.set("settings:site", &settings, cache.default_ttl()).await?;
//! cache.delete_pattern("news:*").await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Cache layer trait
///
/// Generic methods keep this trait out of `dyn` position; services hold
/// the concrete [`Cache`] instead.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a glob pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

/// Hit/miss counters exposed on the admin dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

/// Application cache: the moka store plus hit accounting
#[derive(Debug)]
pub struct Cache {
    store: MemoryCache,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Cache {
    pub fn new(store: MemoryCache) -> Self {
        Self {
            store,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.store.default_ttl()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.sync().await;
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.store.entry_count(),
        }
    }
}

#[async_trait]
impl CacheLayer for Cache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        let value = self.store.get(key).await?;
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(value)
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        self.store.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(key).await
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        tracing::debug!(pattern, "Invalidating cache");
        self.store.delete_pattern(pattern).await
    }

    async fn clear(&self) -> Result<()> {
        tracing::info!("Clearing cache");
        self.store.clear().await
    }
}

/// Create the application cache from configuration
pub fn create_cache(config: &CacheConfig) -> Result<Arc<Cache>> {
    if config.max_entries == 0 {
        anyhow::bail!("cache.max_entries must be greater than zero");
    }
    let ttl = Duration::from_secs(config.ttl_seconds.max(1));
    let store = MemoryCache::with_capacity_and_ttl(config.max_entries, ttl);
    Ok(Arc::new(Cache::new(store)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_cache_from_default_config() {
        let cache = create_cache(&CacheConfig::default()).unwrap();
        assert_eq!(cache.default_ttl(), Duration::from_secs(CacheConfig::default().ttl_seconds));

        cache
            .set("profile:all", &"ok".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        let result: Option<String> = cache.get("profile:all").await.unwrap();
        assert_eq!(result, Some("ok".to_string()));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = CacheConfig {
            ttl_seconds: 60,
            max_entries: 0,
        };
        assert!(create_cache(&config).is_err());
    }

    #[tokio::test]
    async fn test_stats_count_hits_and_misses() {
        let cache = create_cache(&CacheConfig::default()).unwrap();
        let _: Option<i32> = cache.get("events:list").await.unwrap();
        cache.set("events:list", &1, Duration::from_secs(60)).await.unwrap();
        let _: Option<i32> = cache.get("events:list").await.unwrap();
        let _: Option<i32> = cache.get("events:list").await.unwrap();

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }
}
