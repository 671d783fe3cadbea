//! Redis-backed cache.
//!
//! Processes that share one durable store should share one Redis, so an
//! invalidation issued by any of them is seen by all.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, info};

use keel_core::error::{KeelError, Result};
use keel_core::traits::ConfigCache;

/// Cache adapter over a Redis server.
///
/// The connection manager reconnects on its own; a call made while Redis is
/// down fails with `CacheError` and the coordinator carries on without it.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connects to `url` (`redis://[:password@]host[:port][/db]`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(cache_err)?;
        let conn = ConnectionManager::new(client).await.map_err(cache_err)?;
        info!("Connected to Redis cache");
        Ok(Self { conn })
    }
}

fn cache_err(err: redis::RedisError) -> KeelError {
    KeelError::CacheError(err.to_string())
}

/// `SET key value`, plus `EX` for expiring entries. Sub-second TTLs round up.
fn set_command(key: &str, value: &str, ttl: Duration) -> redis::Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value);
    if !ttl.is_zero() {
        let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
        cmd.arg("EX").arg(secs);
    }
    cmd
}

#[async_trait]
impl ConfigCache for RedisCache {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let () = set_command(key, &value, ttl)
            .query_async(&mut conn)
            .await
            .map_err(cache_err)?;
        debug!(key, "Stored snapshot in Redis");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(cache_err)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let removed: u64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(cache_err)?;
        debug!(key, removed, "Deleted snapshot from Redis");
        Ok(())
    }
}
