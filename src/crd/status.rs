//! # BackplaneConfig Status
//!
//! Status types for tracking the aggregate lifecycle of the installed
//! component set.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Condition type reported for overall availability.
pub const CONDITION_AVAILABLE: &str = "Available";

/// Condition type reported while components are still rolling out.
pub const CONDITION_PROGRESSING: &str = "Progressing";

/// Coarse lifecycle phase of the BackplaneConfig.
///
/// `Empty` is the pre-reconciliation value and serializes as `""` so a
/// freshly created resource shows an empty phase column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
pub enum Phase {
    /// Not yet reconciled
    #[default]
    #[serde(rename = "")]
    Empty,
    /// Components are installing or not all reporting Available
    Progressing,
    /// Every configured component reports Available
    Available,
    /// At least one component reports a terminal failure
    Unavailable,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Empty => "",
            Phase::Progressing => "Progressing",
            Phase::Available => "Available",
            Phase::Unavailable => "Unavailable",
        };
        f.write_str(s)
    }
}

/// Health signal reported for a single installed component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
pub enum ComponentHealth {
    /// No report received yet
    #[default]
    Unknown,
    /// Component workload exists but is not ready
    Progressing,
    /// Component workload is fully ready
    Available,
    /// Component workload reports a terminal failure
    Degraded,
}

/// Last-known state of one component, keyed by component name in
/// `BackplaneConfigStatus::components`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentCondition {
    /// Health signal for the component
    #[serde(default)]
    pub health: ComponentHealth,
    /// Human-readable detail, set when the component is not Available
    #[serde(default)]
    pub message: Option<String>,
}

/// Status of the BackplaneConfig resource
///
/// Written only by the reconcile loop via the status subresource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackplaneConfigStatus {
    /// Current aggregate lifecycle phase
    #[serde(default)]
    pub phase: Phase,
    /// Per-component health, ordered by component name.
    /// Never shrinks across successful reconciles.
    #[serde(default)]
    pub components: BTreeMap<String, ComponentCondition>,
    /// Conditions represent the latest available observations.
    /// At most one entry per condition type.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Generation observed by the last reconcile
    #[serde(default)]
    pub observed_generation: Option<i64>,
}

impl BackplaneConfigStatus {
    /// Look up a condition by type.
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == condition_type)
    }
}

/// Condition represents a condition of the BackplaneConfig
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (e.g. "Available")
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    /// Last time the status field changed (RFC3339)
    #[serde(default)]
    pub last_transition_time: Option<String>,
    /// Machine-readable reason for the condition
    #[serde(default)]
    pub reason: Option<String>,
    /// Message describing the condition
    #[serde(default)]
    pub message: Option<String>,
}
