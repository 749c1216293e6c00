use crate::cache::access::AccessCache;
use crate::error::Result;
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// A Redis-backed [`AccessCache`].
///
/// Keys are namespaced per device (`secret_menu:{device_id}:{key}`) so each
/// client gets its own session slot, mirroring a per-browser local store.
/// Entries carry no Redis TTL: expiry is the controller's job.
pub struct RedisAccessCache {
    redis: ConnectionManager,
    namespace: String,
}

impl RedisAccessCache {
    /// Creates a new `RedisAccessCache` scoped to the given namespace.
    pub fn new(redis: ConnectionManager, namespace: String) -> Self {
        Self { redis, namespace }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

#[async_trait]
impl AccessCache for RedisAccessCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.redis.clone();
        let value: Option<String> = conn.get(self.namespaced(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        let _: () = conn.set(self.namespaced(key), value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        let _: () = conn.del(self.namespaced(key)).await?;
        Ok(())
    }
}
