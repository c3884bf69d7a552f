//! # Component Set
//!
//! The compiled-in backplane component set and the health-report types the
//! installer boundary produces. Pure data, no I/O.

use crate::crd::{BackplaneConfigSpec, ComponentHealth};
use std::collections::BTreeSet;

/// Default component set installed by the operator, ordered by name.
pub const DEFAULT_COMPONENTS: &[&str] = &[
    "cluster-manager",
    "cluster-proxy-addon",
    "discovery-operator",
    "hive-operator",
    "managedcluster-import-controller",
    "ocm-controller",
    "ocm-proxyserver",
    "ocm-webhook",
];

/// Minimum number of components that must be reporting before the aggregate
/// phase may read Available. Guards against a short-circuited aggregation
/// reporting healthy with nothing installed.
pub const MIN_AVAILABLE_COMPONENTS: usize = 6;

/// Health report for a single component, as produced by the installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentReport {
    /// Component name; must match an entry in the configured set to count
    /// toward the aggregate phase
    pub name: String,
    /// Reported health signal
    pub health: ComponentHealth,
    /// Detail for non-Available signals
    pub message: Option<String>,
}

impl ComponentReport {
    pub fn new(name: impl Into<String>, health: ComponentHealth) -> Self {
        Self {
            name: name.into(),
            health,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// The set of components a given BackplaneConfig expects, derived from the
/// defaults with spec overrides applied.
#[derive(Debug, Clone)]
pub struct ComponentSet {
    names: BTreeSet<String>,
}

impl ComponentSet {
    /// Resolve the configured set from a spec. Overrides may disable default
    /// components or enable extra ones.
    pub fn from_spec(spec: &BackplaneConfigSpec) -> Self {
        let mut names: BTreeSet<String> = DEFAULT_COMPONENTS
            .iter()
            .map(|n| (*n).to_string())
            .collect();

        if let Some(overrides) = &spec.overrides {
            for (name, enabled) in overrides {
                if *enabled {
                    names.insert(name.clone());
                } else {
                    names.remove(name);
                }
            }
        }

        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Component names in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for ComponentSet {
    fn default() -> Self {
        Self::from_spec(&BackplaneConfigSpec {
            overrides: None,
            target_namespace: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn default_set_contains_all_compiled_in_components() {
        let set = ComponentSet::default();
        assert_eq!(set.len(), DEFAULT_COMPONENTS.len());
        for name in DEFAULT_COMPONENTS {
            assert!(set.contains(name), "missing default component {name}");
        }
    }

    #[test]
    fn overrides_disable_and_enable_components() {
        let mut overrides = BTreeMap::new();
        overrides.insert("hive-operator".to_string(), false);
        overrides.insert("search-operator".to_string(), true);

        let set = ComponentSet::from_spec(&BackplaneConfigSpec {
            overrides: Some(overrides),
            target_namespace: None,
        });

        assert!(!set.contains("hive-operator"));
        assert!(set.contains("search-operator"));
        assert_eq!(set.len(), DEFAULT_COMPONENTS.len());
    }

    #[test]
    fn iteration_is_lexicographic() {
        let set = ComponentSet::default();
        let names: Vec<&str> = set.iter().collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }
}
