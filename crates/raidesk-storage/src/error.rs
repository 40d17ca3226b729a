//! Error types for raidesk-storage
//!
//! Backend-specific failures (SQLite, Redis, JSON) never cross the
//! [`StorageAdapter`](crate::StorageAdapter) boundary as their native types;
//! they are flattened into [`Error::Storage`] with a readable cause.

use thiserror::Error;

/// Storage error type
#[derive(Debug, Error)]
pub enum Error {
    /// Session key absent or expired
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Plan record absent, or the requested version is not part of it
    #[error("Plan not found: {}", plan_label(.id, .version))]
    PlanNotFound {
        /// Plan ID
        id: String,
        /// Requested version, if one was asked for
        version: Option<u32>,
    },

    /// Stored `current_version` moved on since the caller last read the plan
    #[error("Plan version conflict for {id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// Plan ID
        id: String,
        /// Version the caller expected to be current
        expected: u32,
        /// Version actually stored
        actual: u32,
    },

    /// Connection, I/O or (de)serialization failure inside a backend
    #[error("Storage error: {0}")]
    Storage(String),

    /// Malformed input rejected before touching storage
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid backend configuration
    #[error("configuration error: {0}")]
    Configuration(String),
}

fn plan_label(id: &str, version: &Option<u32>) -> String {
    match version {
        Some(v) => format!("{} (version {})", id, v),
        None => id.to_string(),
    }
}

impl Error {
    /// Plan-not-found for the whole record
    pub fn plan_not_found(id: impl Into<String>) -> Self {
        Self::PlanNotFound {
            id: id.into(),
            version: None,
        }
    }

    /// Plan-not-found for a specific version
    pub fn plan_version_not_found(id: impl Into<String>, version: u32) -> Self {
        Self::PlanNotFound {
            id: id.into(),
            version: Some(version),
        }
    }

    /// True for missing sessions, plans and plan versions
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound(_) | Self::PlanNotFound { .. })
    }

    /// True when the backend itself failed (as opposed to a missing resource)
    #[must_use]
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_not_found_message() {
        let err = Error::plan_not_found("p1");
        assert_eq!(err.to_string(), "Plan not found: p1");

        let err = Error::plan_version_not_found("p1", 3);
        assert_eq!(err.to_string(), "Plan not found: p1 (version 3)");
        assert!(err.is_not_found());
        assert!(!err.is_storage_failure());
    }

    #[test]
    fn test_session_not_found_is_distinct_from_storage() {
        let missing = Error::SessionNotFound("abc".to_string());
        let broken = Error::Storage("Redis GET failed: connection refused".to_string());

        assert!(missing.is_not_found());
        assert!(!broken.is_not_found());
        assert!(broken.is_storage_failure());
        assert!(broken.to_string().starts_with("Storage error:"));
    }

    #[test]
    fn test_version_conflict_message() {
        let err = Error::VersionConflict {
            id: "p1".to_string(),
            expected: 2,
            actual: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("expected 2"));
        assert!(msg.contains("found 3"));
    }
}
