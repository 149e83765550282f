//! Listing cache and its backends.

pub mod backend;
pub mod listing;

use std::time::Duration;

pub use backend::{CacheBackend, CacheError, CacheLookup};
pub use listing::{LISTING_KEY, ListingError, RecipeListingCache};

use crate::config::RedisConfig;

/// Builds the cache backend from configuration.
///
/// With Redis disabled the cache is process-local. With Redis enabled the
/// server must reach it: every instance has to see the same listing, so
/// there is no fallback to a local cache.
pub async fn create_cache_backend(config: &RedisConfig) -> Result<CacheBackend, CacheError> {
    if !config.enabled {
        tracing::info!("Redis disabled, using local cache");
        return Ok(CacheBackend::new_local());
    }

    tracing::info!(url = %config.url, "Connecting to Redis");

    let timeout = Some(Duration::from_millis(config.timeout_ms));
    let mut pool_config = deadpool_redis::PoolConfig::new(config.pool_size);
    pool_config.timeouts.wait = timeout;
    pool_config.timeouts.create = timeout;
    pool_config.timeouts.recycle = timeout;

    let mut redis_config = deadpool_redis::Config::from_url(&config.url);
    redis_config.pool = Some(pool_config);

    let pool = redis_config
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .map_err(|e| CacheError::Connection(e.to_string()))?;

    let backend = CacheBackend::new_redis(pool);
    backend.ping().await?;
    tracing::info!("Connected to Redis");
    Ok(backend)
}
