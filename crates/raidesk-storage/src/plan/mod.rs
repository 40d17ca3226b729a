//! Versioned plan storage
//!
//! Plans live under the `plan:` namespace, one [`PlanRecord`] per plan ID
//! holding its whole append-only history. Plans never expire unless a TTL
//! is configured.

mod model;
mod record;
mod repository;

pub use model::{
    CommonStandards, PerformanceEvaluation, Plan, PlanTier, RiskLevel, TimelineItem,
};
pub use record::{PlanRecord, PlanVersion};
pub use repository::PlanRepository;
