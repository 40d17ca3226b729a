//! RAiDesk Storage - sessions and versioned plans
//!
//! This crate provides the persistence layer of the RAiDesk backend:
//! - Adapter: a uniform async key → JSON document store with per-key TTL
//! - Backends: embedded SQLite (lazy expiry sweep) and Redis (native expiry)
//! - Sessions: short-lived mergeable documents under `session:`
//! - Plans: append-only version history with a current-version pointer under `plan:`
//!
//! A backend is opened once from [`StorageConfig`] and handed to
//! [`SessionManager`] and [`PlanRepository`] explicitly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod backend;
pub mod error;
pub mod keys;
pub mod plan;
pub mod redis_adapter;
pub mod session;
pub mod sqlite_adapter;
pub mod sweeper;
pub mod timestamp;

pub use adapter::{Document, StorageAdapter, MAX_TTL_SECS};
pub use backend::{open_storage, StorageBackend, StorageConfig, StorageKind};
pub use error::{Error, Result};
pub use keys::{plan_key, session_key, PLAN_PREFIX, SESSION_PREFIX};
pub use plan::{
    CommonStandards, PerformanceEvaluation, Plan, PlanRecord, PlanRepository, PlanTier,
    PlanVersion, RiskLevel, TimelineItem,
};
pub use redis_adapter::RedisAdapter;
pub use session::{Session, SessionManager, DEFAULT_SESSION_TTL_SECS};
pub use sqlite_adapter::SqliteAdapter;
pub use sweeper::spawn_expiry_sweeper;
