//! SQLite storage backend
//!
//! Embedded, file-based [`StorageAdapter`] - the default backend for RAiDesk.
//!
//! # Schema
//!
//! One table, `storage(key, value, expires_at, created_at, updated_at)`.
//! Documents are stored as JSON text; `expires_at` is NULL for documents
//! that never expire.
//!
//! # Expiry
//!
//! Expiry is lazy: `get`, `exists` and `list_keys` first delete every row
//! whose `expires_at` has passed, then query. An expired row nobody reads
//! keeps its disk space until the next sweep (or until
//! [`spawn_expiry_sweeper`](crate::spawn_expiry_sweeper) runs
//! [`purge_expired`](StorageAdapter::purge_expired)).
//!
//! # Usage
//!
//! ```no_run
//! use raidesk_storage::{SqliteAdapter, StorageAdapter};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = SqliteAdapter::new("./raidesk.db");
//! storage.connect().await?;
//! # Ok(())
//! # }
//! ```

use crate::adapter::{checked_ttl, Document, StorageAdapter};
use crate::error::{Error, Result};
use crate::keys::{glob_to_like, LIKE_ESCAPE};
use crate::timestamp;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// `now + secs`, failing instead of wrapping or panicking
fn expiry_after(now: DateTime<Utc>, secs: u64) -> Result<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| Error::Validation(format!("TTL of {} seconds is out of range", secs)))
}

/// Where the database lives
#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// SQLite storage adapter
///
/// All statements go through a single pooled connection, so operations on
/// one adapter are serialized at the database.
pub struct SqliteAdapter {
    location: Location,
    pool: RwLock<Option<SqlitePool>>,
}

impl SqliteAdapter {
    /// Adapter for a database file (created on `connect` if missing)
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            location: Location::File(path.as_ref().to_path_buf()),
            pool: RwLock::new(None),
        }
    }

    /// Adapter over a private in-memory database (for testing)
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            pool: RwLock::new(None),
        }
    }

    /// Create and connect an in-memory adapter in one step
    pub async fn connect_in_memory() -> Result<Self> {
        let adapter = Self::in_memory();
        adapter.connect().await?;
        Ok(adapter)
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions> {
        let options = match &self.location {
            Location::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        Error::Storage(format!("Failed to create database directory: {}", e))
                    })?;
                }
                SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
                    .map_err(|e| Error::Storage(format!("Invalid SQLite path: {}", e)))?
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
            }
            Location::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| Error::Storage(format!("Invalid SQLite URL: {}", e)))?,
        };

        // Globs are case-sensitive; LIKE is not unless told otherwise.
        Ok(options.pragma("case_sensitive_like", "ON"))
    }

    /// Clone the live pool handle, or fail if `connect` has not run
    async fn pool(&self) -> Result<SqlitePool> {
        self.pool
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::Storage("Database not connected".to_string()))
    }

    /// Initialize the database schema
    async fn init_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to create storage table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_storage_expires_at ON storage(expires_at)")
            .execute(pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create index: {}", e)))?;

        debug!("SQLite storage schema initialized");
        Ok(())
    }

    /// Delete rows whose expiry has passed
    async fn sweep(pool: &SqlitePool) -> Result<u64> {
        let now = timestamp::format(&Utc::now());
        let result =
            sqlx::query("DELETE FROM storage WHERE expires_at IS NOT NULL AND expires_at <= ?")
                .bind(&now)
                .execute(pool)
                .await
                .map_err(|e| Error::Storage(format!("Failed to sweep expired rows: {}", e)))?;

        let removed = result.rows_affected();
        if removed > 0 {
            debug!(removed = removed, "Swept expired rows");
        }
        Ok(removed)
    }

    #[cfg(test)]
    pub(crate) async fn raw_pool(&self) -> SqlitePool {
        self.pool().await.expect("connected")
    }
}

#[async_trait]
impl StorageAdapter for SqliteAdapter {
    async fn connect(&self) -> Result<()> {
        let mut guard = self.pool.write().await;
        if guard.is_some() {
            return Ok(());
        }

        let options = self.connect_options()?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            // An in-memory database vanishes with its last connection.
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| Error::Storage(format!("Failed to connect to SQLite: {}", e)))?;

        if let Err(e) = Self::init_schema(&pool).await {
            pool.close().await;
            return Err(e);
        }

        match &self.location {
            Location::File(path) => info!(path = %path.display(), "SQLite storage connected"),
            Location::Memory => debug!("In-memory SQLite storage connected"),
        }
        *guard = Some(pool);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if let Some(pool) = self.pool.write().await.take() {
            pool.close().await;
            info!("SQLite storage disconnected");
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Document>> {
        let pool = self.pool().await?;
        Self::sweep(&pool).await?;

        let now = timestamp::format(&Utc::now());
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT value FROM storage WHERE key = ? AND (expires_at IS NULL OR expires_at > ?)",
        )
        .bind(key)
        .bind(&now)
        .fetch_optional(&pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to get {}: {}", key, e)))?;

        match row {
            Some((raw,)) => {
                let doc = serde_json::from_str(&raw).map_err(|e| {
                    Error::Storage(format!("Failed to deserialize {}: {}", key, e))
                })?;
                debug!(key = %key, "Document loaded from SQLite");
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &Document, ttl_secs: Option<u64>) -> Result<()> {
        let ttl = checked_ttl(ttl_secs)?;
        let pool = self.pool().await?;
        let raw = serde_json::to_string(value)
            .map_err(|e| Error::Storage(format!("Failed to serialize {}: {}", key, e)))?;

        let now = Utc::now();
        let expires_at = match ttl {
            Some(secs) => Some(timestamp::format(&expiry_after(now, secs)?)),
            None => None,
        };
        let now = timestamp::format(&now);

        sqlx::query(
            r#"
            INSERT INTO storage (key, value, expires_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(&raw)
        .bind(expires_at)
        .bind(&now)
        .bind(&now)
        .execute(&pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to set {}: {}", key, e)))?;

        debug!(key = %key, ttl = ?ttl_secs, "Document saved to SQLite");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let pool = self.pool().await?;
        let result = sqlx::query("DELETE FROM storage WHERE key = ?")
            .bind(key)
            .execute(&pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to delete {}: {}", key, e)))?;

        debug!(key = %key, deleted = result.rows_affected() > 0, "Document deleted from SQLite");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let pool = self.pool().await?;
        Self::sweep(&pool).await?;

        let now = timestamp::format(&Utc::now());
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM storage WHERE key = ? AND (expires_at IS NULL OR expires_at > ?)",
        )
        .bind(key)
        .bind(&now)
        .fetch_optional(&pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to check {}: {}", key, e)))?;

        Ok(row.is_some())
    }

    async fn list_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let pool = self.pool().await?;
        Self::sweep(&pool).await?;

        let now = timestamp::format(&Utc::now());
        let sql = format!(
            "SELECT key FROM storage WHERE key LIKE ? ESCAPE '{}' \
             AND (expires_at IS NULL OR expires_at > ?) ORDER BY key",
            LIKE_ESCAPE
        );
        let rows: Vec<(String,)> = sqlx::query_as(&sql)
            .bind(glob_to_like(pattern))
            .bind(&now)
            .fetch_all(&pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to list keys: {}", e)))?;

        Ok(rows.into_iter().map(|(k,)| k).collect())
    }

    async fn clear_all(&self) -> Result<()> {
        let pool = self.pool().await?;
        let result = sqlx::query("DELETE FROM storage")
            .execute(&pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to clear storage: {}", e)))?;

        info!(removed = result.rows_affected(), "SQLite storage cleared");
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let pool = self.pool().await?;
        Ok(Self::sweep(&pool).await? as usize)
    }

    async fn health_check(&self) -> Result<bool> {
        let pool = self.pool().await?;
        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| Error::Storage(format!("Health check failed: {}", e)))?;
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
