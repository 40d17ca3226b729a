//! Plan repository

use super::model::Plan;
use super::record::PlanRecord;
use crate::adapter::{Document, StorageAdapter};
use crate::error::{Error, Result};
use crate::keys::{namespace_pattern, plan_key, PLAN_PREFIX};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Durable, versioned plan storage on top of a [`StorageAdapter`]
///
/// Writes to the same plan ID are serialized inside this repository, so
/// concurrent `save` calls each get their own version. Writers in other
/// processes are not covered; use [`PlanRepository::save_expecting`] to
/// detect them.
pub struct PlanRepository {
    storage: Arc<dyn StorageAdapter>,
    ttl_secs: Option<u64>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl PlanRepository {
    /// Create a repository. `ttl_secs = None` keeps plans forever.
    pub fn new(storage: Arc<dyn StorageAdapter>, ttl_secs: Option<u64>) -> Self {
        Self {
            storage,
            ttl_secs,
            locks: DashMap::new(),
        }
    }

    /// Configured plan TTL
    #[must_use]
    pub fn ttl_secs(&self) -> Option<u64> {
        self.ttl_secs
    }

    /// Run `op` while holding the write lock for `id`
    async fn locked<T, F, Fut>(&self, id: &str, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let lock = self.locks.entry(id.to_string()).or_default().clone();
        let result = {
            let _guard = lock.lock().await;
            op().await
        };
        drop(lock);
        self.locks.remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn load(&self, id: &str) -> Result<Option<PlanRecord>> {
        match self.storage.get(&plan_key(id)).await? {
            Some(doc) => serde_json::from_value(doc)
                .map(Some)
                .map_err(|e| Error::Storage(format!("Failed to read plan {}: {}", id, e))),
            None => Ok(None),
        }
    }

    async fn store(&self, record: &PlanRecord) -> Result<()> {
        let doc = serde_json::to_value(record)
            .map_err(|e| Error::Storage(format!("Failed to serialize plan {}: {}", record.id, e)))?;
        self.storage
            .set(&plan_key(&record.id), &doc, self.ttl_secs)
            .await
    }

    /// Save a plan as a new version
    ///
    /// The first save for an ID creates version 1; later saves append
    /// `current_version + 1` and make it current. `session_id` is recorded on
    /// creation and only fills in a record that has none.
    pub async fn save(
        &self,
        plan: &Plan,
        session_id: Option<&str>,
        modifications: Option<&str>,
    ) -> Result<PlanRecord> {
        self.save_versioned(plan, session_id, modifications, None)
            .await
    }

    /// Like [`save`](Self::save), but only if the stored `current_version`
    /// equals `expected_version` (0 for a plan that does not exist yet)
    ///
    /// Fails with [`Error::VersionConflict`] and writes nothing otherwise.
    pub async fn save_expecting(
        &self,
        plan: &Plan,
        session_id: Option<&str>,
        modifications: Option<&str>,
        expected_version: u32,
    ) -> Result<PlanRecord> {
        self.save_versioned(plan, session_id, modifications, Some(expected_version))
            .await
    }

    async fn save_versioned(
        &self,
        plan: &Plan,
        session_id: Option<&str>,
        modifications: Option<&str>,
        expected_version: Option<u32>,
    ) -> Result<PlanRecord> {
        if plan.id.trim().is_empty() {
            return Err(Error::Validation("Plan id must not be empty".to_string()));
        }
        let plan_data = serde_json::to_value(plan)
            .map_err(|e| Error::Storage(format!("Failed to serialize plan {}: {}", plan.id, e)))?;

        self.locked(&plan.id, || async {
            let existing = self.load(&plan.id).await?;

            if let Some(expected) = expected_version {
                let actual = existing.as_ref().map_or(0, |r| r.current_version);
                if actual != expected {
                    return Err(Error::VersionConflict {
                        id: plan.id.clone(),
                        expected,
                        actual,
                    });
                }
            }

            let record = match existing {
                Some(mut record) => {
                    record.push_version(plan_data, modifications)?;
                    if record.session_id.is_none() {
                        record.session_id = session_id.map(str::to_string);
                    }
                    record
                }
                None => PlanRecord::new(&plan.id, session_id, plan_data, modifications),
            };
            self.store(&record).await?;

            info!(
                plan_id = %record.id,
                version = record.current_version,
                "Plan saved"
            );
            Ok(record)
        })
        .await
    }

    /// Full record with every version
    pub async fn get_record(&self, id: &str) -> Result<PlanRecord> {
        self.load(id)
            .await?
            .ok_or_else(|| Error::plan_not_found(id))
    }

    /// Raw plan document for `version`, or the current one
    ///
    /// A dangling `current_version` falls back to the latest version.
    pub async fn get_document(&self, id: &str, version: Option<u32>) -> Result<Document> {
        let record = self.get_record(id).await?;
        let found = match version {
            Some(v) => record
                .version(v)
                .ok_or_else(|| Error::plan_version_not_found(id, v))?,
            None => record.current().ok_or_else(|| Error::plan_not_found(id))?,
        };
        Ok(found.plan_data.clone())
    }

    /// Plan for `version`, or the current one
    pub async fn get(&self, id: &str, version: Option<u32>) -> Result<Plan> {
        let doc = self.get_document(id, version).await?;
        serde_json::from_value(doc)
            .map_err(|e| Error::Storage(format!("Stored plan {} is malformed: {}", id, e)))
    }

    /// Delete a plan with all of its versions
    ///
    /// The record has to exist and parse, otherwise nothing is removed.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.locked(id, || async {
            self.get_record(id).await?;
            self.storage.delete(&plan_key(id)).await?;
            debug!(plan_id = %id, "Plan deleted");
            Ok(())
        })
        .await
    }

    /// Check if a plan exists
    pub async fn exists(&self, id: &str) -> Result<bool> {
        self.storage.exists(&plan_key(id)).await
    }

    /// Every stored plan record, optionally only those of one session
    ///
    /// Malformed or unreadable records are skipped.
    pub async fn list(&self, session_id: Option<&str>) -> Result<Vec<PlanRecord>> {
        let keys = self
            .storage
            .list_keys(&namespace_pattern(PLAN_PREFIX))
            .await?;

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            let doc = match self.storage.get(&key).await {
                Ok(Some(doc)) => doc,
                Ok(None) => continue,
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping unreadable plan");
                    continue;
                }
            };
            let record: PlanRecord = match serde_json::from_value(doc) {
                Ok(record) => record,
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping malformed plan");
                    continue;
                }
            };
            if session_id.map_or(true, |sid| record.session_id.as_deref() == Some(sid)) {
                records.push(record);
            }
        }
        Ok(records)
    }
}
