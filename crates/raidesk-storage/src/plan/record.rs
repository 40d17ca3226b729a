//! Versioned plan records
//!
//! A [`PlanRecord`] is the unit stored under `plan:<id>`. Versions are
//! append-only and numbered `1..=N` in insertion order; `current_version`
//! names the one returned by default.

use crate::adapter::Document;
use crate::error::{Error, Result};
use crate::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One immutable version of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanVersion {
    /// Version number, starting at 1
    pub version: u32,
    /// Full plan document as saved
    pub plan_data: Document,
    /// What changed relative to the previous version
    #[serde(default)]
    pub modifications: Option<String>,
    /// When this version was written
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// All versions of one plan plus its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    /// Plan ID, shared by every version
    pub id: String,
    /// Session the plan was generated in
    #[serde(default)]
    pub session_id: Option<String>,
    /// Version returned when none is requested
    pub current_version: u32,
    /// History, oldest first
    pub versions: Vec<PlanVersion>,
    /// First save
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last save
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl PlanRecord {
    pub(crate) fn new(
        id: &str,
        session_id: Option<&str>,
        plan_data: Document,
        modifications: Option<&str>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            session_id: session_id.map(str::to_string),
            current_version: 1,
            versions: vec![PlanVersion {
                version: 1,
                plan_data,
                modifications: modifications.map(str::to_string),
                created_at: now,
            }],
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a new version and make it current
    ///
    /// Fails without touching the record once the version counter is at `u32::MAX`.
    pub(crate) fn push_version(
        &mut self,
        plan_data: Document,
        modifications: Option<&str>,
    ) -> Result<()> {
        let next = self.current_version.checked_add(1).ok_or_else(|| {
            Error::Storage(format!("Plan {} version counter exhausted", self.id))
        })?;
        let now = Utc::now();
        self.versions.push(PlanVersion {
            version: next,
            plan_data,
            modifications: modifications.map(str::to_string),
            created_at: now,
        });
        self.current_version = next;
        self.updated_at = now;
        Ok(())
    }

    /// Look up a specific version
    pub fn version(&self, version: u32) -> Option<&PlanVersion> {
        self.versions.iter().find(|v| v.version == version)
    }

    /// The current version
    ///
    /// If `current_version` points at nothing, the most recently appended
    /// version is returned instead. `None` only for a record with no versions.
    pub fn current(&self) -> Option<&PlanVersion> {
        match self.version(self.current_version) {
            Some(v) => Some(v),
            None => {
                let latest = self.versions.last();
                if let Some(v) = latest {
                    warn!(
                        plan_id = %self.id,
                        current_version = self.current_version,
                        fallback_version = v.version,
                        "Current version pointer is dangling, using latest version"
                    );
                }
                latest
            }
        }
    }

    /// Plan document of the current version
    pub fn current_plan(&self) -> Option<&Document> {
        self.current().map(|v| &v.plan_data)
    }
}
