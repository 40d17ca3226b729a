//! Backend selection
//!
//! The backend is picked once at startup from [`StorageConfig`] and shared for
//! the life of the process. Callers hold it as `Arc<dyn StorageAdapter>`.

use crate::adapter::{Document, StorageAdapter, MAX_TTL_SECS};
use crate::error::{Error, Result};
use crate::redis_adapter::RedisAdapter;
use crate::sqlite_adapter::SqliteAdapter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Which storage technology to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Embedded SQLite file (default)
    Sqlite,
    /// Remote Redis server
    Redis,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "embedded" => Ok(Self::Sqlite),
            "redis" | "networked" => Ok(Self::Redis),
            other => Err(Error::Configuration(format!(
                "Unknown storage backend: '{}'. Use 'sqlite' or 'redis'.",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Redis => write!(f, "redis"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend type: "sqlite" (default) or "redis"
    #[serde(default = "default_backend")]
    pub backend: String,

    /// SQLite database path (only used when backend = "sqlite")
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Redis URL (only used when backend = "redis")
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Session expiry in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Plan expiry in seconds (unset = plans never expire)
    #[serde(default)]
    pub plan_ttl_secs: Option<u64>,

    /// Interval of the background expiry sweep in seconds (0 = lazy sweep only)
    #[serde(default)]
    pub sweep_interval_secs: u64,
}

fn default_backend() -> String {
    "sqlite".to_string()
}

fn default_database_path() -> String {
    "./raidesk.db".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_session_ttl() -> u64 {
    86400 // 24 hours
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            database_path: default_database_path(),
            redis_url: default_redis_url(),
            session_ttl_secs: default_session_ttl(),
            plan_ttl_secs: None,
            sweep_interval_secs: 0,
        }
    }
}

impl StorageConfig {
    /// Parsed backend kind
    pub fn kind(&self) -> Result<StorageKind> {
        self.backend.parse()
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> Result<()> {
        self.kind()?;
        if self.session_ttl_secs == 0 {
            return Err(Error::Configuration(
                "session_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.session_ttl_secs > MAX_TTL_SECS {
            return Err(Error::Configuration(format!(
                "session_ttl_secs must not exceed {}",
                MAX_TTL_SECS
            )));
        }
        if self.plan_ttl_secs.is_some_and(|ttl| ttl > MAX_TTL_SECS) {
            return Err(Error::Configuration(format!(
                "plan_ttl_secs must not exceed {}",
                MAX_TTL_SECS
            )));
        }
        if self.kind()? == StorageKind::Sqlite && self.database_path.trim().is_empty() {
            return Err(Error::Configuration(
                "database_path must not be empty for the sqlite backend".to_string(),
            ));
        }
        Ok(())
    }
}

/// Unified storage backend that wraps the concrete adapters
pub enum StorageBackend {
    /// SQLite storage (default)
    Sqlite(SqliteAdapter),
    /// Redis storage
    Redis(RedisAdapter),
}

impl StorageBackend {
    /// Build the configured backend without connecting it
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        config.validate()?;
        match config.kind()? {
            StorageKind::Sqlite => Ok(Self::Sqlite(SqliteAdapter::new(&config.database_path))),
            StorageKind::Redis => Ok(Self::Redis(RedisAdapter::new(&config.redis_url)?)),
        }
    }
}

/// Build, connect and share the configured backend
pub async fn open_storage(config: &StorageConfig) -> Result<Arc<dyn StorageAdapter>> {
    let backend = StorageBackend::from_config(config)?;
    backend.connect().await?;
    info!(backend = backend.backend_name(), "Storage backend ready");
    Ok(Arc::new(backend))
}

#[async_trait]
impl StorageAdapter for StorageBackend {
    async fn connect(&self) -> Result<()> {
        match self {
            Self::Sqlite(store) => store.connect().await,
            Self::Redis(store) => store.connect().await,
        }
    }

    async fn disconnect(&self) -> Result<()> {
        match self {
            Self::Sqlite(store) => store.disconnect().await,
            Self::Redis(store) => store.disconnect().await,
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Document>> {
        match self {
            Self::Sqlite(store) => store.get(key).await,
            Self::Redis(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &Document, ttl_secs: Option<u64>) -> Result<()> {
        match self {
            Self::Sqlite(store) => store.set(key, value, ttl_secs).await,
            Self::Redis(store) => store.set(key, value, ttl_secs).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self {
            Self::Sqlite(store) => store.delete(key).await,
            Self::Redis(store) => store.delete(key).await,
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self {
            Self::Sqlite(store) => store.exists(key).await,
            Self::Redis(store) => store.exists(key).await,
        }
    }

    async fn list_keys(&self, pattern: &str) -> Result<Vec<String>> {
        match self {
            Self::Sqlite(store) => store.list_keys(pattern).await,
            Self::Redis(store) => store.list_keys(pattern).await,
        }
    }

    async fn clear_all(&self) -> Result<()> {
        match self {
            Self::Sqlite(store) => store.clear_all().await,
            Self::Redis(store) => store.clear_all().await,
        }
    }

    async fn purge_expired(&self) -> Result<usize> {
        match self {
            Self::Sqlite(store) => store.purge_expired().await,
            Self::Redis(store) => store.purge_expired().await,
        }
    }

    async fn health_check(&self) -> Result<bool> {
        match self {
            Self::Sqlite(store) => store.health_check().await,
            Self::Redis(store) => store.health_check().await,
        }
    }

    fn backend_name(&self) -> &'static str {
        match self {
            Self::Sqlite(store) => store.backend_name(),
            Self::Redis(store) => store.backend_name(),
        }
    }
}
