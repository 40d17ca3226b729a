//! Session manager
//!
//! Sessions are short-lived, mergeable JSON documents under the `session:`
//! namespace. Every write (create or update) stores the session with the
//! full `session_ttl`, so activity that writes keeps a session alive while
//! reads never do. Both backends behave the same way here because each
//! `set` replaces the key's TTL.

use crate::adapter::StorageAdapter;
use crate::error::{Error, Result};
use crate::keys::{namespace_pattern, session_key, SESSION_PREFIX};
use crate::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default session TTL in seconds
pub const DEFAULT_SESSION_TTL_SECS: u64 = 86400;

/// A stored session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (UUID v4)
    pub id: String,
    /// Arbitrary caller data, shallow-merged on update
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Creation time
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Session {
    fn new(data: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Shallow merge: keys in `patch` overwrite, others are kept
    fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            self.data.insert(key, value);
        }
        self.updated_at = Utc::now();
    }
}

/// Manages session lifecycle on top of a [`StorageAdapter`]
pub struct SessionManager {
    storage: Arc<dyn StorageAdapter>,
    ttl_secs: u64,
}

impl SessionManager {
    /// Create a session manager with the given TTL in seconds
    pub fn new(storage: Arc<dyn StorageAdapter>, ttl_secs: u64) -> Self {
        Self { storage, ttl_secs }
    }

    /// Create a session manager with the default 24h TTL
    pub fn with_default_ttl(storage: Arc<dyn StorageAdapter>) -> Self {
        Self::new(storage, DEFAULT_SESSION_TTL_SECS)
    }

    /// Configured TTL in seconds
    #[must_use]
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    async fn store(&self, session: &Session) -> Result<()> {
        let doc = serde_json::to_value(session)
            .map_err(|e| Error::Storage(format!("Failed to serialize session: {}", e)))?;
        self.storage
            .set(&session_key(&session.id), &doc, Some(self.ttl_secs))
            .await
    }

    /// Create a new session, optionally seeded with data
    pub async fn create(&self, initial_data: Option<Map<String, Value>>) -> Result<Session> {
        let session = Session::new(initial_data.unwrap_or_default());
        self.store(&session).await?;

        debug!(session_id = %session.id, ttl = self.ttl_secs, "Session created");
        Ok(session)
    }

    /// Get a session by ID
    pub async fn get(&self, id: &str) -> Result<Session> {
        let doc = self
            .storage
            .get(&session_key(id))
            .await?
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;

        serde_json::from_value(doc)
            .map_err(|e| Error::Storage(format!("Failed to read session {}: {}", id, e)))
    }

    /// Merge `patch` into the session's data and store it again
    pub async fn update(&self, id: &str, patch: Map<String, Value>) -> Result<Session> {
        let mut session = self.get(id).await?;
        session.merge(patch);
        self.store(&session).await?;

        debug!(session_id = %id, "Session updated");
        Ok(session)
    }

    /// Delete a session
    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.storage.exists(&session_key(id)).await? {
            return Err(Error::SessionNotFound(id.to_string()));
        }
        self.storage.delete(&session_key(id)).await?;

        debug!(session_id = %id, "Session deleted");
        Ok(())
    }

    /// Check if a session exists
    pub async fn exists(&self, id: &str) -> Result<bool> {
        self.storage.exists(&session_key(id)).await
    }

    /// List every live session
    ///
    /// Entries that vanish mid-scan or fail to load are skipped.
    pub async fn list(&self) -> Result<Vec<Session>> {
        let keys = self
            .storage
            .list_keys(&namespace_pattern(SESSION_PREFIX))
            .await?;

        let mut sessions = Vec::with_capacity(keys.len());
        for key in keys {
            match self.storage.get(&key).await {
                Ok(Some(doc)) => match serde_json::from_value::<Session>(doc) {
                    Ok(session) => sessions.push(session),
                    Err(e) => warn!(key = %key, error = %e, "Skipping malformed session"),
                },
                Ok(None) => {}
                Err(e) => warn!(key = %key, error = %e, "Skipping unreadable session"),
            }
        }
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests;
