//! Key-value cache: a process-local DashMap or a shared Redis instance.

use std::sync::Arc;

use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use thiserror::Error;

/// Errors from the cache other than a plain miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection failed: {0}")]
    Connection(String),

    #[error("cache command failed: {0}")]
    Command(#[from] redis::RedisError),
}

impl From<deadpool_redis::PoolError> for CacheError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        CacheError::Connection(err.to_string())
    }
}

/// Result of a cache read. A miss is not an error.
#[derive(Debug)]
pub enum CacheLookup {
    Hit(Arc<Vec<u8>>),
    Miss,
    Error(CacheError),
}

/// Cache backend.
///
/// - **Local**: one process, values live in a DashMap.
/// - **Redis**: every instance reads and writes the same keys, so an
///   invalidation by one instance is seen by all of them.
///
/// Entries never expire on their own; they stay until deleted or
/// overwritten. Writes and deletes are awaited; callers learn about
/// failures.
#[derive(Clone)]
pub enum CacheBackend {
    Local(Arc<DashMap<String, Arc<Vec<u8>>>>),
    Redis(Pool),
}

impl std::fmt::Debug for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::Local(map) => f.debug_struct("Local").field("entries", &map.len()).finish(),
            CacheBackend::Redis(pool) => f
                .debug_struct("Redis")
                .field("pool_size", &pool.status().size)
                .finish(),
        }
    }
}

impl CacheBackend {
    pub fn new_local() -> Self {
        CacheBackend::Local(Arc::new(DashMap::new()))
    }

    pub fn new_redis(pool: Pool) -> Self {
        CacheBackend::Redis(pool)
    }

    pub fn mode(&self) -> &'static str {
        match self {
            CacheBackend::Local(_) => "local",
            CacheBackend::Redis(_) => "redis",
        }
    }

    pub async fn get(&self, key: &str) -> CacheLookup {
        match self {
            CacheBackend::Local(map) => match map.get(key) {
                Some(entry) => {
                    tracing::debug!(key = %key, "cache hit (local)");
                    CacheLookup::Hit(Arc::clone(entry.value()))
                }
                None => {
                    tracing::debug!(key = %key, "cache miss");
                    CacheLookup::Miss
                }
            },
            CacheBackend::Redis(pool) => {
                let mut conn = match pool.get().await {
                    Ok(conn) => conn,
                    Err(e) => return CacheLookup::Error(e.into()),
                };
                match conn.get::<_, Option<Vec<u8>>>(key).await {
                    Ok(Some(data)) => {
                        tracing::debug!(key = %key, "cache hit (redis)");
                        CacheLookup::Hit(Arc::new(data))
                    }
                    Ok(None) => {
                        tracing::debug!(key = %key, "cache miss");
                        CacheLookup::Miss
                    }
                    Err(e) => CacheLookup::Error(e.into()),
                }
            }
        }
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        match self {
            CacheBackend::Local(map) => {
                map.insert(key.to_string(), Arc::new(value));
            }
            CacheBackend::Redis(pool) => {
                let mut conn = pool.get().await?;
                conn.set::<_, _, ()>(key, value).await?;
            }
        }
        tracing::debug!(key = %key, "cache set");
        Ok(())
    }

    /// Removes `key`. Deleting an absent key succeeds.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self {
            CacheBackend::Local(map) => {
                map.remove(key);
            }
            CacheBackend::Redis(pool) => {
                let mut conn = pool.get().await?;
                conn.del::<_, ()>(key).await?;
            }
        }
        tracing::debug!(key = %key, "cache entry deleted");
        Ok(())
    }

    /// Round trip to the backing store.
    pub async fn ping(&self) -> Result<(), CacheError> {
        match self {
            CacheBackend::Local(_) => Ok(()),
            CacheBackend::Redis(pool) => {
                let mut conn = pool.get().await?;
                let _: String = redis::cmd("PING").query_async(&mut conn).await?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_get_set_delete() {
        let cache = CacheBackend::new_local();
        assert!(matches!(cache.get("k").await, CacheLookup::Miss));

        cache.set("k", b"value".to_vec()).await.unwrap();
        match cache.get("k").await {
            CacheLookup::Hit(data) => assert_eq!(data.as_slice(), b"value"),
            other => panic!("expected hit, got {other:?}"),
        }

        cache.delete("k").await.unwrap();
        assert!(matches!(cache.get("k").await, CacheLookup::Miss));
        cache.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_local_set_overwrites_and_keeps_value() {
        let cache = CacheBackend::new_local();
        cache.set("k", b"first".to_vec()).await.unwrap();
        cache.set("k", b"second".to_vec()).await.unwrap();

        match cache.get("k").await {
            CacheLookup::Hit(data) => assert_eq!(data.as_slice(), b"second"),
            other => panic!("expected hit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_local_ping_and_mode() {
        let cache = CacheBackend::new_local();
        assert!(cache.ping().await.is_ok());
        assert_eq!(cache.mode(), "local");
    }
}
