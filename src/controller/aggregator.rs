//! # Status Aggregation
//!
//! Derives the next BackplaneConfig status from the current status and a set
//! of per-component health reports. Pure function of its inputs; persistence
//! is the reconciler's responsibility.

use crate::controller::components::{ComponentReport, ComponentSet, MIN_AVAILABLE_COMPONENTS};
use crate::crd::{
    BackplaneConfigStatus, ComponentCondition, ComponentHealth, Condition, Phase,
    CONDITION_AVAILABLE, CONDITION_PROGRESSING,
};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Compute the next status from the current status and the latest component
/// reports.
///
/// The components map merges over the previous map so it never shrinks across
/// reconciles. Reports for names outside the configured set are recorded for
/// observability but excluded from phase derivation.
pub fn aggregate(
    current: &BackplaneConfigStatus,
    reports: &[ComponentReport],
    components: &ComponentSet,
    observed_generation: Option<i64>,
    now: DateTime<Utc>,
) -> BackplaneConfigStatus {
    let mut merged = current.components.clone();
    for report in reports {
        if !components.contains(&report.name) {
            debug!(
                component = %report.name,
                "report for component outside the configured set, recording only"
            );
        }
        merged.insert(
            report.name.clone(),
            ComponentCondition {
                health: report.health,
                message: report.message.clone(),
            },
        );
    }

    let phase = derive_phase(&merged, components);

    let mut conditions = current.conditions.clone();
    set_condition(
        &mut conditions,
        available_condition(phase, &merged, components),
        now,
    );
    set_condition(
        &mut conditions,
        progressing_condition(phase, &merged, components),
        now,
    );

    BackplaneConfigStatus {
        phase,
        components: merged,
        conditions,
        observed_generation,
    }
}

/// Phase derivation over the configured component set:
/// Unavailable if any configured component is Degraded, Available only when
/// every configured component reports Available and the reporting cardinality
/// meets the static minimum, Progressing otherwise.
fn derive_phase(
    merged: &std::collections::BTreeMap<String, ComponentCondition>,
    components: &ComponentSet,
) -> Phase {
    let mut reported = 0usize;
    let mut all_available = true;

    for name in components.iter() {
        match merged.get(name) {
            Some(c) if c.health == ComponentHealth::Degraded => return Phase::Unavailable,
            Some(c) => {
                reported += 1;
                if c.health != ComponentHealth::Available {
                    all_available = false;
                }
            }
            None => all_available = false,
        }
    }

    if all_available && reported == components.len() && reported >= MIN_AVAILABLE_COMPONENTS {
        Phase::Available
    } else {
        Phase::Progressing
    }
}

/// First configured component, in lexicographic order, that is not reporting
/// Available. Returns the component name and a detail message.
fn first_unavailable(
    merged: &std::collections::BTreeMap<String, ComponentCondition>,
    components: &ComponentSet,
) -> Option<(String, String)> {
    for name in components.iter() {
        match merged.get(name) {
            Some(c) if c.health == ComponentHealth::Available => {}
            Some(c) => {
                let detail = c
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("component {name} is {:?}", c.health));
                return Some((name.to_string(), detail));
            }
            None => {
                return Some((name.to_string(), format!("component {name} has not reported")));
            }
        }
    }
    None
}

fn available_condition(
    phase: Phase,
    merged: &std::collections::BTreeMap<String, ComponentCondition>,
    components: &ComponentSet,
) -> Condition {
    if phase == Phase::Available {
        return Condition {
            r#type: CONDITION_AVAILABLE.to_string(),
            status: "True".to_string(),
            last_transition_time: None,
            reason: Some("ComponentsAvailable".to_string()),
            message: Some("all components are available".to_string()),
        };
    }

    let (reason, message) = match first_unavailable(merged, components) {
        Some((name, detail)) => (format!("{name}NotAvailable"), detail),
        None => (
            "ComponentsNotReporting".to_string(),
            "component reports are incomplete".to_string(),
        ),
    };

    Condition {
        r#type: CONDITION_AVAILABLE.to_string(),
        status: "False".to_string(),
        last_transition_time: None,
        reason: Some(reason),
        message: Some(message),
    }
}

fn progressing_condition(
    phase: Phase,
    merged: &std::collections::BTreeMap<String, ComponentCondition>,
    components: &ComponentSet,
) -> Condition {
    let (status, reason, message) = match phase {
        Phase::Progressing | Phase::Empty => {
            let detail = first_unavailable(merged, components)
                .map(|(_, d)| d)
                .unwrap_or_else(|| "components are rolling out".to_string());
            ("True", "ComponentsProgressing", detail)
        }
        Phase::Available => (
            "False",
            "ComponentsAvailable",
            "all components are available".to_string(),
        ),
        Phase::Unavailable => (
            "False",
            "ComponentsDegraded",
            first_unavailable(merged, components)
                .map(|(_, d)| d)
                .unwrap_or_else(|| "a component is degraded".to_string()),
        ),
    };

    Condition {
        r#type: CONDITION_PROGRESSING.to_string(),
        status: status.to_string(),
        last_transition_time: None,
        reason: Some(reason.to_string()),
        message: Some(message),
    }
}

/// Replace the condition of the same type in place, keeping at most one entry
/// per type. The transition time only moves when the status field changes.
fn set_condition(conditions: &mut Vec<Condition>, mut next: Condition, now: DateTime<Utc>) {
    match conditions.iter_mut().find(|c| c.r#type == next.r#type) {
        Some(existing) => {
            next.last_transition_time = if existing.status == next.status {
                existing.last_transition_time.clone()
            } else {
                Some(now.to_rfc3339())
            };
            *existing = next;
        }
        None => {
            next.last_transition_time = Some(now.to_rfc3339());
            conditions.push(next);
        }
    }
}
