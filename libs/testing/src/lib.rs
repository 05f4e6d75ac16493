//! Fixtures and assertions shared by the simulation test suites.

use std::collections::BTreeSet;

use ssta_cluster::{ClusterConfig, ClusterState, SamplingMode, TimeCosts, ZoneSpec};
use ssta_reconcile::ZoneCount;

/// Zones of the reference scenario.
pub const REFERENCE_ZONES: [&str; 3] = ["AZ-1", "AZ-2", "AZ-3"];

/// Three zones with five nodes each, and three A, one B and one C workload
/// per zone.
pub fn reference_config(seed: u64) -> ClusterConfig {
    ClusterConfig {
        zones: REFERENCE_ZONES
            .iter()
            .map(|zone| ZoneSpec::new(*zone, 5))
            .collect(),
        initial_workloads: reference_composition(|_, _| true),
        max_nodes: 15,
        time_costs: TimeCosts::default(),
        sampling: SamplingMode::WithReplacement,
        seed: Some(seed),
    }
}

/// The reference composition without any B or C workload in AZ-3.
pub fn reference_target() -> Vec<ZoneCount> {
    reference_composition(|workload_type, zone| workload_type == "A" || zone != "AZ-3")
}

fn reference_composition(keep: impl Fn(&str, &str) -> bool) -> Vec<ZoneCount> {
    let mut composition = Vec::new();
    for (workload_type, count) in [("A", 3), ("B", 1), ("C", 1)] {
        for zone in REFERENCE_ZONES {
            let count = if keep(workload_type, zone) { count } else { 0 };
            composition.push(ZoneCount::new(workload_type, zone, count));
        }
    }
    composition
}

/// One zone, `nodes` nodes, `workloads` workloads of type A.
pub fn single_zone_config(nodes: u32, workloads: u32, max_nodes: usize, seed: u64) -> ClusterConfig {
    ClusterConfig {
        zones: vec![ZoneSpec::new("AZ-1", nodes)],
        initial_workloads: vec![ZoneCount::new("A", "AZ-1", workloads)],
        max_nodes,
        time_costs: TimeCosts::default(),
        sampling: SamplingMode::WithReplacement,
        seed: Some(seed),
    }
}

/// Assert the cross-entity invariants and id uniqueness.
pub fn assert_cluster_invariants(state: &ClusterState) {
    if let Err(e) = state.verify_invariants() {
        panic!("cluster invariants broken: {e}\n{state}");
    }

    let node_ids: BTreeSet<_> = state.nodes().iter().map(|n| n.id()).collect();
    assert_eq!(node_ids.len(), state.count_nodes(), "duplicate node id\n{state}");

    let workload_ids: BTreeSet<_> = state.workloads().iter().map(|w| w.id()).collect();
    assert_eq!(
        workload_ids.len(),
        state.count_workloads(),
        "duplicate workload id\n{state}"
    );
}
