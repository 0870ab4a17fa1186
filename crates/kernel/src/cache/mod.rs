//! Two-tier cache with Moka (L1) and Redis (L2).
//!
//! Holds the derived announcement strings shared by every instance.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use redis::AsyncCommands;
use redis::Client as RedisClient;
use tracing::{debug, warn};

/// Default TTL for L1 cache (60 seconds).
const L1_TTL_SECS: u64 = 60;

/// Maximum L1 cache capacity.
const L1_MAX_CAPACITY: u64 = 1_000;

/// Prefix of every L2 key.
const KEY_PREFIX: &str = "cache:";

/// Two-tier cache layer.
///
/// L1 (Moka): In-process, short TTL, per-instance
/// L2 (Redis): Shared across instances, authoritative
#[derive(Clone)]
pub struct CacheLayer {
    inner: Arc<CacheLayerInner>,
}

struct CacheLayerInner {
    /// L1 in-process cache.
    local: Cache<String, String>,

    /// L2 Redis client.
    redis: RedisClient,
}

impl CacheLayer {
    /// Create a new cache layer.
    pub fn new(redis: RedisClient) -> Self {
        let local = Cache::builder()
            .max_capacity(L1_MAX_CAPACITY)
            .time_to_live(Duration::from_secs(L1_TTL_SECS))
            .build();

        Self {
            inner: Arc::new(CacheLayerInner { local, redis }),
        }
    }

    fn redis_key(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }

    /// Get a value from cache.
    ///
    /// Checks L1 first, then L2. On L2 hit, populates L1.
    pub async fn get(&self, key: &str) -> Option<String> {
        if let Some(val) = self.inner.local.get(key).await {
            debug!(key = %key, "cache L1 hit");
            return Some(val);
        }

        let mut conn = match self.inner.redis.get_multiplexed_async_connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "failed to get Redis connection for cache");
                return None;
            }
        };

        let val: Option<String> = match conn.get(Self::redis_key(key)).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, key = %key, "failed to read cache value from Redis");
                return None;
            }
        };

        if let Some(ref v) = val {
            debug!(key = %key, "cache L2 hit, populating L1");
            self.inner.local.insert(key.to_string(), v.clone()).await;
        }

        val
    }

    /// Set a value in both tiers.
    ///
    /// With no `ttl` the L2 entry persists until it is invalidated.
    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        self.inner
            .local
            .insert(key.to_string(), value.to_string())
            .await;

        let Ok(mut conn) = self.inner.redis.get_multiplexed_async_connection().await else {
            warn!("failed to get Redis connection for cache set");
            return;
        };

        let redis_key = Self::redis_key(key);
        let result = match ttl {
            Some(ttl) => {
                conn.set_ex::<_, _, ()>(&redis_key, value, ttl.as_secs().max(1))
                    .await
            }
            None => conn.set::<_, _, ()>(&redis_key, value).await,
        };

        if let Err(e) = result {
            warn!(error = %e, key = %key, "failed to set cache value in Redis");
            return;
        }

        debug!(key = %key, ttl = ?ttl, "cache set");
    }

    /// Invalidate a single cache key.
    pub async fn invalidate(&self, key: &str) {
        self.inner.local.invalidate(key).await;

        let Ok(mut conn) = self.inner.redis.get_multiplexed_async_connection().await else {
            warn!("failed to get Redis connection for cache invalidate");
            return;
        };

        if let Err(e) = conn.del::<_, ()>(Self::redis_key(key)).await {
            warn!(error = %e, key = %key, "failed to delete cache key from Redis");
        }

        debug!(key = %key, "cache invalidated");
    }
}

impl std::fmt::Debug for CacheLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLayer").finish()
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn redis_keys_are_prefixed() {
        assert_eq!(
            CacheLayer::redis_key("RECENT_ANNOUNCEMENTS"),
            "cache:RECENT_ANNOUNCEMENTS"
        );
    }

    #[tokio::test]
    async fn l1_hit_does_not_touch_redis() {
        // Creating the client does not connect
        let client = RedisClient::open("redis://127.0.0.1:6379").unwrap();
        let cache = CacheLayer::new(client);

        cache
            .inner
            .local
            .insert("FEATURED_SPEAKER".to_string(), "hello".to_string())
            .await;

        assert_eq!(cache.get("FEATURED_SPEAKER").await.as_deref(), Some("hello"));
    }
}
