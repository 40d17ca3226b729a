//! Storage adapter trait
//!
//! A uniform async key → JSON document store with optional per-key TTL.
//! Adapters carry no business semantics; namespaces and document shapes are
//! imposed by [`SessionManager`](crate::SessionManager) and
//! [`PlanRepository`](crate::PlanRepository).

use crate::error::{Error, Result};
use async_trait::async_trait;

/// Longest accepted TTL (100 years)
pub const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// A stored document: any JSON value, normally an object
pub type Document = serde_json::Value;

/// Storage adapter trait for abstracting storage backends
///
/// Backend failures are reported as [`Error::Storage`](crate::Error::Storage);
/// backend-native error types never escape an implementation. A TTL above
/// [`MAX_TTL_SECS`] is rejected with [`Error::Validation`](crate::Error::Validation).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Establish connection and schema state. Calling it again once connected is a no-op.
    async fn connect(&self) -> Result<()>;

    /// Release backend resources. Safe when never (or only partially) connected.
    async fn disconnect(&self) -> Result<()>;

    /// Fetch a document; expired documents are reported as absent
    async fn get(&self, key: &str) -> Result<Option<Document>>;

    /// Upsert a document. `None` or `Some(0)` means it never expires; any
    /// other TTL replaces the previous one for this key.
    async fn set(&self, key: &str, value: &Document, ttl_secs: Option<u64>) -> Result<()>;

    /// Remove a key. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;

    /// True iff `get` would return a document
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Keys matching a glob (`*` any run, `?` one character), expired keys excluded
    async fn list_keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Remove every key (maintenance and tests only)
    async fn clear_all(&self) -> Result<()>;

    /// Physically drop expired entries, returning how many went away
    async fn purge_expired(&self) -> Result<usize>;

    /// Round-trip to the backend
    async fn health_check(&self) -> Result<bool>;

    /// Short backend identifier for logs and health output
    fn backend_name(&self) -> &'static str;
}

/// Normalize a TTL: `None` when it means "never expires", an error when it is out of range
pub(crate) fn checked_ttl(ttl_secs: Option<u64>) -> Result<Option<u64>> {
    match ttl_secs {
        None | Some(0) => Ok(None),
        Some(secs) if secs > MAX_TTL_SECS => Err(Error::Validation(format!(
            "TTL of {} seconds exceeds the maximum of {} seconds",
            secs, MAX_TTL_SECS
        ))),
        Some(secs) => Ok(Some(secs)),
    }
}
