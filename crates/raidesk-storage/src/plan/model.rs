//! Regulatory plan model
//!
//! Wire names are camelCase, matching what the plan-generation agents emit.

use serde::{Deserialize, Serialize};

/// Plan tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Shortest route to approval
    Fastest,
    /// Balanced route
    Normal,
    /// Lowest regulatory risk
    Conservative,
    /// Novel pathway
    Innovative,
}

/// Regulatory risk of following a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Low risk
    Low,
    /// Medium risk
    Medium,
    /// High risk
    High,
}

/// One phase of a plan timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    /// Phase name
    pub phase: String,
    /// What happens in this phase
    pub description: String,
    /// Human-readable duration, e.g. "4-6 weeks"
    pub duration: String,
    /// Phases that must finish first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
    /// Outputs of the phase
    pub deliverables: Vec<String>,
}

/// Standards every tier has to satisfy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonStandards {
    /// Timeline
    pub timeline: Vec<TimelineItem>,
    /// Applicable standards (e.g. ISO 13485)
    pub standards: Vec<String>,
    /// Required documentation
    pub documentation: Vec<String>,
}

/// Performance evaluation track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEvaluation {
    /// Timeline
    pub timeline: Vec<TimelineItem>,
    /// Tests to run
    pub tests: Vec<String>,
    /// Required documentation
    pub documentation: Vec<String>,
}

/// A compliance plan for one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Caller-chosen plan ID, stable across versions
    pub id: String,
    /// Tier
    pub tier: PlanTier,
    /// Title
    pub title: String,
    /// Summary
    pub description: String,
    /// Overall duration
    pub total_duration: String,
    /// Cost estimate
    #[serde(default)]
    pub estimated_cost: Option<String>,
    /// Risk level
    pub risk_level: RiskLevel,
    /// Common standards track
    pub common_standards: CommonStandards,
    /// Performance evaluation track
    pub performance_evaluation: PerformanceEvaluation,
    /// Advantages
    pub pros: Vec<String>,
    /// Drawbacks
    pub cons: Vec<String>,
    /// Recommendations
    pub recommendations: Vec<String>,
}
