//! Read-through cache wrapping every analytics computation.
//!
//! Keys are `prefix:param1:param2:...`; callers must keep parameter order
//! stable across calls to the same logical operation, or identical requests
//! fragment into distinct keys. Concurrent misses for one key de-duplicate on
//! a per-key lock and re-check the cache before computing.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::AppError;

/// TTL tiers, matched to how fast the underlying fact changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Real-time facts: hot lists, realtime sentiment.
    Short,
    /// Statistics and trend series.
    Medium,
    /// Categorical / geographic distributions.
    Long,
    /// Rarely-changing base data.
    VeryLong,
}

impl Ttl {
    pub fn seconds(self) -> u64 {
        match self {
            Ttl::Short => 60,
            Ttl::Medium => 300,
            Ttl::Long => 1800,
            Ttl::VeryLong => 3600,
        }
    }
}

/// Builds a cache key from a fixed prefix and ordered parameter values.
pub fn cache_key(prefix: &str, params: &[&str]) -> String {
    if params.is_empty() {
        prefix.to_string()
    } else {
        format!("{}:{}", prefix, params.join(":"))
    }
}

/// String-keyed KV store behind the cache layer. Production runs on Redis;
/// tests swap in an in-memory map, the same seam pattern as `DataProvider`.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

pub struct RedisBackend {
    client: redis::Client,
}

impl RedisBackend {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, value, ttl_seconds).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }
}

/// Cache-aside layer over a KV backend.
#[derive(Clone)]
pub struct CacheLayer {
    backend: Arc<dyn CacheBackend>,
    inflight: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl CacheLayer {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get-or-compute-and-store. On a hit the stored value is returned; on a
    /// miss `factory` runs once per key at a time, its result is stored with
    /// `ttl`, and waiting misses re-read the fresh entry instead of
    /// recomputing.
    ///
    /// The miss path runs in a spawned task: if the surrounding request is
    /// cancelled, the population still completes so other readers do not see
    /// a permanently cold key.
    pub async fn get_or_set<T, F, Fut>(&self, key: &str, ttl: Ttl, factory: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        if let Some(hit) = self.read::<T>(key).await? {
            debug!(key, "cache hit");
            return Ok(hit);
        }

        let this = self.clone();
        let key = key.to_string();
        let handle = tokio::spawn(async move {
            let lock = this.inflight_lock(&key).await;
            let result = {
                let _guard = lock.lock().await;
                this.compute_and_store(&key, ttl, factory).await
            };
            drop(lock);
            this.release_inflight(&key).await;
            result
        });

        handle
            .await
            .map_err(|e| AppError::Cache(format!("cache population task failed: {e}")))?
    }

    /// Drops a cached entry, forcing the next read to recompute.
    pub async fn invalidate(&self, key: &str) -> Result<(), AppError> {
        self.backend.delete(key).await
    }

    async fn compute_and_store<T, F, Fut>(&self, key: &str, ttl: Ttl, factory: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        // A concurrent miss may have populated the key while we waited.
        if let Some(hit) = self.read::<T>(key).await? {
            debug!(key, "cache hit after wait");
            return Ok(hit);
        }

        debug!(key, ttl = ttl.seconds(), "cache miss, computing");
        let value = factory().await?;
        self.write(key, &value, ttl).await?;
        Ok(value)
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.backend.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T, ttl: Ttl) -> Result<(), AppError> {
        let raw = serde_json::to_string(value)?;
        self.backend.set(key, raw, ttl.seconds()).await
    }

    async fn inflight_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut map = self.inflight.lock().await;
        map.entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn release_inflight(&self, key: &str) {
        let mut map = self.inflight.lock().await;
        // Keep the entry while other misses still hold the lock.
        if map.get(key).map(Arc::strong_count) == Some(1) {
            map.remove(key);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::MemoryBackend;
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn memory_cache() -> CacheLayer {
        CacheLayer::new(Arc::new(MemoryBackend::default()))
    }

    #[test]
    fn test_cache_key_joins_params_in_order() {
        assert_eq!(
            cache_key("events:trends", &["7d", "day"]),
            "events:trends:7d:day"
        );
    }

    #[test]
    fn test_cache_key_without_params_is_prefix() {
        assert_eq!(cache_key("events:hot", &[]), "events:hot");
    }

    #[test]
    fn test_ttl_tiers() {
        assert_eq!(Ttl::Short.seconds(), 60);
        assert_eq!(Ttl::Medium.seconds(), 300);
        assert_eq!(Ttl::Long.seconds(), 1800);
        assert_eq!(Ttl::VeryLong.seconds(), 3600);
    }

    #[tokio::test]
    async fn test_miss_computes_then_hit_returns_stored_value() {
        let cache = memory_cache();
        let first: i64 = cache
            .get_or_set("k", Ttl::Medium, || async { Ok::<_, AppError>(7i64) })
            .await
            .unwrap();
        assert_eq!(first, 7);

        // second factory must not win: the stored value is returned
        let second: i64 = cache
            .get_or_set("k", Ttl::Medium, || async { Ok::<_, AppError>(99i64) })
            .await
            .unwrap();
        assert_eq!(second, 7);
    }

    #[tokio::test]
    async fn test_concurrent_misses_invoke_factory_once() {
        let cache = memory_cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_set("stampede", Ttl::Short, move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(25)).await;
                        Ok::<_, AppError>(42i64)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 42);
        }
        // waiting misses re-read the populated entry instead of recomputing
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_caller_still_populates_the_key() {
        let cache = memory_cache();
        let calls = Arc::new(AtomicUsize::new(0));

        {
            let cache = cache.clone();
            let calls = calls.clone();
            let pending = cache.get_or_set("slow", Ttl::Short, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok::<_, AppError>(7i64)
            });
            // drop the caller mid-flight, as a cancelled request would
            let cancelled = tokio::time::timeout(Duration::from_millis(5), pending).await;
            assert!(cancelled.is_err());
        }

        // the spawned population outlives its caller
        tokio::time::sleep(Duration::from_millis(80)).await;
        let value: i64 = cache
            .get_or_set("slow", Ttl::Short, || async { Ok::<_, AppError>(99i64) })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_recompute() {
        let cache = memory_cache();
        let _: i64 = cache
            .get_or_set("base", Ttl::VeryLong, || async { Ok::<_, AppError>(1i64) })
            .await
            .unwrap();
        cache.invalidate("base").await.unwrap();
        let value: i64 = cache
            .get_or_set("base", Ttl::VeryLong, || async { Ok::<_, AppError>(2i64) })
            .await
            .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_factory_error_is_not_cached() {
        let cache = memory_cache();
        let err = cache
            .get_or_set("flaky", Ttl::Short, || async {
                Err::<i64, _>(AppError::Cache("boom".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Cache(_)));

        // next call recomputes and succeeds
        let value: i64 = cache
            .get_or_set("flaky", Ttl::Short, || async { Ok::<_, AppError>(5i64) })
            .await
            .unwrap();
        assert_eq!(value, 5);
    }
}
