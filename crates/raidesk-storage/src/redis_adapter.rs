//! Redis storage backend
//!
//! Networked [`StorageAdapter`] for deployments that already run Redis.
//!
//! # Features
//!
//! - TTL delegated to Redis (`SET ... EX`), no sweeping needed
//! - One multiplexed connection opened on `connect` and shared by every call
//! - `list_keys` walks the keyspace with `SCAN` instead of the blocking `KEYS`
//!
//! Consider enabling Redis AUTH and TLS in production.

use crate::adapter::{checked_ttl, Document, StorageAdapter};
use crate::error::{Error, Result};
use crate::keys::glob_to_redis;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Keys requested per `SCAN` round trip
const SCAN_BATCH: usize = 500;

/// Redis storage adapter
pub struct RedisAdapter {
    client: redis::Client,
    conn: RwLock<Option<MultiplexedConnection>>,
}

impl RedisAdapter {
    /// Create a Redis adapter (no I/O until `connect`)
    ///
    /// # Errors
    ///
    /// Returns error if the Redis URL is invalid
    pub fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::Storage(format!("Invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            conn: RwLock::new(None),
        })
    }

    /// Clone the shared connection handle
    async fn connection(&self) -> Result<MultiplexedConnection> {
        self.conn
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::Storage("Redis not connected".to_string()))
    }
}

#[async_trait]
impl StorageAdapter for RedisAdapter {
    async fn connect(&self) -> Result<()> {
        let mut guard = self.conn.write().await;
        if guard.is_some() {
            return Ok(());
        }

        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Storage(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| Error::Storage(format!("Redis PING failed: {}", e)))?;

        info!("Redis storage connected");
        *guard = Some(conn);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        // The multiplexed driver task ends once the last handle drops.
        if self.conn.write().await.take().is_some() {
            info!("Redis storage disconnected");
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Document>> {
        let mut conn = self.connection().await?;

        let data: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Storage(format!("Redis GET failed: {}", e)))?;

        match data {
            Some(json) => {
                let doc = serde_json::from_str(&json).map_err(|e| {
                    Error::Storage(format!("Failed to deserialize {}: {}", key, e))
                })?;
                debug!(key = %key, "Document loaded from Redis");
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &Document, ttl_secs: Option<u64>) -> Result<()> {
        let ttl = checked_ttl(ttl_secs)?;
        let mut conn = self.connection().await?;
        let json = serde_json::to_string(value)
            .map_err(|e| Error::Storage(format!("Failed to serialize {}: {}", key, e)))?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(&json);
        if let Some(secs) = ttl {
            cmd.arg("EX").arg(secs);
        }
        // A plain SET also drops any TTL the key had before.
        cmd.query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::Storage(format!("Redis SET failed: {}", e)))?;

        debug!(key = %key, ttl = ?ttl_secs, "Document saved to Redis");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;

        let deleted: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Storage(format!("Redis DEL failed: {}", e)))?;

        debug!(key = %key, deleted = deleted > 0, "Document deleted from Redis");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;

        let exists: i64 = redis::cmd("EXISTS")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Storage(format!("Redis EXISTS failed: {}", e)))?;

        Ok(exists > 0)
    }

    async fn list_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        let pattern = glob_to_redis(pattern);

        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| Error::Storage(format!("Redis SCAN failed: {}", e)))?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may report a key more than once
        keys.sort();
        keys.dedup();
        debug!(pattern = %pattern, count = keys.len(), "Scanned Redis keys");
        Ok(keys)
    }

    async fn clear_all(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        redis::cmd("FLUSHDB")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::Storage(format!("Redis FLUSHDB failed: {}", e)))?;

        info!("Redis storage cleared");
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        // Redis TTL handles expiration automatically
        debug!("Redis TTL handles expiration automatically");
        Ok(0)
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| Error::Storage(format!("Health check failed: {}", e)))?;
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
