//! Key-value backend abstraction and its Redis implementation.

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::error::StoreError;

/// The handful of key-value operations the session store needs:
/// read, write with TTL, delete, and a key scan by pattern.
pub trait KvBackend: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Write `value` under `key`, expiring after `ttl_ms`
    /// milliseconds. Caller guarantees `ttl_ms > 0`.
    fn set(
        &self,
        key: &str,
        value: &str,
        ttl_ms: u64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Idempotent delete.
    fn del(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All live keys matching a glob pattern, e.g. `login:*`.
    fn keys(&self, pattern: &str) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;
}

/// Redis-backed [`KvBackend`] over a multiplexed connection manager.
///
/// The manager is cheap to clone and reconnects on its own; one
/// instance is shared by every handler.
#[derive(Clone)]
pub struct RedisKv {
    conn: ConnectionManager,
}

impl RedisKv {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

impl KvBackend for RedisKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_ms: u64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        // KEYS walks the whole key space in one blocking call. At a
        // larger scale this becomes cursor-based SCAN.
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }
}
