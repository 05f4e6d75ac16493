//! Configuration consumed when a cluster state is constructed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ssta_reconcile::ZoneCount;

use crate::error::{ClusterError, ClusterResult};
use crate::heuristics::SamplingMode;

/// Simulated time charged for each kind of action.
///
/// The clock is a plain counter; units are arbitrary (seconds in the
/// reference scenario).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeCosts {
    /// Cost of provisioning one node.
    pub add_node: u64,

    /// Cost of one `remove_node` call (per-node evictions are charged on top).
    pub remove_node: u64,

    /// Cost of one eviction call.
    pub evict_workload: u64,

    /// Cost of submitting one new workload.
    pub schedule_workload: u64,
}

impl Default for TimeCosts {
    fn default() -> Self {
        Self {
            add_node: 10 * 60,
            remove_node: 2 * 60,
            evict_workload: 30,
            schedule_workload: 30,
        }
    }
}

/// An availability zone and the number of nodes it starts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSpec {
    /// Zone label.
    pub name: String,

    /// Nodes created in this zone at initialization.
    #[serde(default)]
    pub initial_nodes: u32,
}

impl ZoneSpec {
    /// Create a new zone spec.
    pub fn new(name: impl Into<String>, initial_nodes: u32) -> Self {
        Self {
            name: name.into(),
            initial_nodes,
        }
    }
}

/// Cluster construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Recognized availability zones, in order.
    pub zones: Vec<ZoneSpec>,

    /// Workloads created (pending) at initialization.
    #[serde(default)]
    pub initial_workloads: Vec<ZoneCount>,

    /// Ceiling on the number of nodes.
    pub max_nodes: usize,

    /// Per-action simulated time costs.
    #[serde(default)]
    pub time_costs: TimeCosts,

    /// Sampling used by the eviction and node-removal heuristics.
    #[serde(default)]
    pub sampling: SamplingMode,

    /// Seed for the selection policies; drawn from the OS when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ClusterConfig {
    /// Zone labels in configuration order.
    pub fn zone_names(&self) -> Vec<String> {
        self.zones.iter().map(|z| z.name.clone()).collect()
    }

    /// Total number of nodes created at initialization.
    pub fn initial_node_count(&self) -> usize {
        self.zones.iter().map(|z| z.initial_nodes as usize).sum()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ClusterResult<()> {
        if self.zones.is_empty() {
            return Err(invalid("at least one availability zone is required"));
        }
        if self.max_nodes == 0 {
            return Err(invalid("max_nodes must be greater than zero"));
        }

        let mut names = BTreeSet::new();
        for zone in &self.zones {
            if zone.name.trim().is_empty() {
                return Err(invalid("zone names must be non-empty"));
            }
            if !names.insert(zone.name.as_str()) {
                return Err(invalid(format!("zone '{}' is listed twice", zone.name)));
            }
        }

        if self.initial_node_count() > self.max_nodes {
            return Err(invalid(format!(
                "{} initial nodes exceed max_nodes of {}; increase max_nodes or change the allocation",
                self.initial_node_count(),
                self.max_nodes
            )));
        }

        for workload in &self.initial_workloads {
            if workload.workload_type.trim().is_empty() {
                return Err(invalid("workload types must be non-empty"));
            }
            if !names.contains(workload.zone.as_str()) {
                return Err(invalid(format!(
                    "workload type '{}' targets unknown zone '{}'",
                    workload.workload_type, workload.zone
                )));
            }
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ClusterError {
    ClusterError::InvalidConfig(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClusterConfig {
        ClusterConfig {
            zones: vec![ZoneSpec::new("AZ-1", 2), ZoneSpec::new("AZ-2", 2)],
            initial_workloads: vec![ZoneCount::new("A", "AZ-1", 1)],
            max_nodes: 4,
            time_costs: TimeCosts::default(),
            sampling: SamplingMode::default(),
            seed: Some(1),
        }
    }

    #[test]
    fn test_default_time_costs() {
        let costs = TimeCosts::default();
        assert_eq!(costs.add_node, 600);
        assert_eq!(costs.remove_node, 120);
        assert_eq!(costs.evict_workload, 30);
        assert_eq!(costs.schedule_workload, 30);
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
        assert_eq!(config().initial_node_count(), 4);
        assert_eq!(config().zone_names(), vec!["AZ-1", "AZ-2"]);
    }

    #[test]
    fn test_too_many_initial_nodes() {
        let mut config = config();
        config.max_nodes = 3;
        assert!(matches!(
            config.validate(),
            Err(ClusterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_duplicate_zone() {
        let mut config = config();
        config.zones.push(ZoneSpec::new("AZ-1", 0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_workload_zone() {
        let mut config = config();
        config
            .initial_workloads
            .push(ZoneCount::new("B", "AZ-9", 1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_time_costs_deserialize() {
        let costs: TimeCosts = serde_json::from_str(r#"{"add_node": 300}"#).unwrap();
        assert_eq!(costs.add_node, 300);
        assert_eq!(costs.remove_node, 120);
    }
}
