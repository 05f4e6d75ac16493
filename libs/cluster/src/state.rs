//! Live cluster state: the node pool, the workload set, and the clock.
//!
//! `ClusterState` is the single owner of every node and workload in a run.
//! All cross-entity consistency is maintained here:
//!
//! - a workload holds a node id exactly when it is busy
//! - that node exists and is busy
//! - no two workloads hold the same node
//! - the node count never exceeds `max_nodes`
//!
//! Random choices are delegated to [`Heuristics`]. Every mutating operation
//! advances the simulated clock by its configured [`TimeCosts`] entry.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ssta_id::{NodeId, WorkloadId};
use ssta_reconcile::{total_count, ZoneCount};
use tracing::{debug, warn};

use crate::config::{ClusterConfig, TimeCosts};
use crate::error::{require_label, ClusterError, ClusterResult};
use crate::heuristics::{Heuristics, SamplingMode};
use crate::node::Node;
use crate::workload::Workload;

/// Point-in-time copy of the entities and clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub clock: u64,
    pub nodes: Vec<Node>,
    pub workloads: Vec<Workload>,
}

/// Filter for workload counting queries.
///
/// Unset fields match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkloadFilter<'a> {
    pub workload_type: Option<&'a str>,
    pub zone: Option<&'a str>,
    pub scheduled_only: bool,
}

impl<'a> WorkloadFilter<'a> {
    fn validate(&self) -> ClusterResult<()> {
        if let Some(workload_type) = self.workload_type {
            require_label("workload type", workload_type)?;
        }
        if let Some(zone) = self.zone {
            require_label("zone", zone)?;
        }
        Ok(())
    }

    fn matches(&self, workload: &Workload) -> bool {
        self.workload_type.is_none_or(|t| workload.workload_type() == t)
            && self.zone.is_none_or(|z| workload.zone() == z)
            && (!self.scheduled_only || workload.is_scheduled())
    }
}

/// The simulated cluster.
#[derive(Debug, Clone)]
pub struct ClusterState {
    zones: Vec<String>,
    workload_types: Vec<String>,
    max_nodes: usize,
    time_costs: TimeCosts,
    nodes: Vec<Node>,
    workloads: Vec<Workload>,
    clock: u64,
    last_node_id: NodeId,
    last_workload_id: WorkloadId,
    heuristics: Heuristics,
}

impl ClusterState {
    /// Build the initial state and run one placement pass.
    ///
    /// Nodes are numbered from 1 in zone order and workloads from 1 in
    /// composition order. The initial placement does not advance the clock.
    pub fn new(config: &ClusterConfig) -> ClusterResult<Self> {
        config.validate()?;

        let requested = total_count(&config.initial_workloads);
        if requested > config.max_nodes as u64 {
            warn!(
                workloads = requested,
                max_nodes = config.max_nodes,
                "More workloads are to be allocated than nodes may exist"
            );
        }

        let mut nodes = Vec::with_capacity(config.initial_node_count());
        let mut node_id = NodeId::FIRST;
        for zone in &config.zones {
            for _ in 0..zone.initial_nodes {
                nodes.push(Node::new(node_id, &zone.name)?);
                node_id = node_id.next();
            }
        }

        let mut workloads = Vec::new();
        let mut workload_types: Vec<String> = Vec::new();
        let mut workload_id = WorkloadId::FIRST;
        for composition in &config.initial_workloads {
            if !workload_types.contains(&composition.workload_type) {
                workload_types.push(composition.workload_type.clone());
            }
            for _ in 0..composition.count {
                workloads.push(Workload::new(
                    workload_id,
                    &composition.workload_type,
                    &composition.zone,
                )?);
                workload_id = workload_id.next();
            }
        }

        let heuristics = match config.seed {
            Some(seed) => Heuristics::new(seed, config.sampling),
            None => Heuristics::from_entropy(config.sampling),
        };

        let mut state = Self {
            zones: config.zone_names(),
            workload_types,
            max_nodes: config.max_nodes,
            time_costs: config.time_costs,
            last_node_id: NodeId::new(nodes.len() as u64),
            last_workload_id: WorkloadId::new(workloads.len() as u64),
            nodes,
            workloads,
            clock: 0,
            heuristics,
        };
        state.update_workload_node_allocation()?;

        debug!(
            nodes = state.nodes.len(),
            workloads = state.workloads.len(),
            "Initialized cluster state"
        );
        Ok(state)
    }

    /// Restart the selection policies from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.heuristics.reseed(seed);
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn workloads(&self) -> &[Workload] {
        &self.workloads
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn workload(&self, id: WorkloadId) -> Option<&Workload> {
        self.workloads.iter().find(|w| w.id() == id)
    }

    pub fn zones(&self) -> &[String] {
        &self.zones
    }

    /// Workload types in first-seen order.
    pub fn workload_types(&self) -> &[String] {
        &self.workload_types
    }

    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    pub fn time_costs(&self) -> TimeCosts {
        self.time_costs
    }

    pub fn sampling(&self) -> SamplingMode {
        self.heuristics.sampling()
    }

    /// Simulated time consumed so far.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Copy out nodes, workloads and the clock.
    pub fn snapshot(&self) -> ClusterSnapshot {
        ClusterSnapshot {
            clock: self.clock,
            nodes: self.nodes.clone(),
            workloads: self.workloads.clone(),
        }
    }

    // -------------------------------------------------------------------------
    // Counters
    // -------------------------------------------------------------------------

    pub fn count_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn count_workloads(&self) -> usize {
        self.workloads.len()
    }

    /// Count workloads matching `filter`.
    pub fn count_workloads_matching(&self, filter: &WorkloadFilter<'_>) -> ClusterResult<usize> {
        filter.validate()?;
        Ok(self.workloads.iter().filter(|w| filter.matches(w)).count())
    }

    pub fn count_workloads_of_type(&self, workload_type: &str) -> ClusterResult<usize> {
        self.count_workloads_matching(&WorkloadFilter {
            workload_type: Some(workload_type),
            ..Default::default()
        })
    }

    pub fn count_workloads_in_zone(&self, zone: &str) -> ClusterResult<usize> {
        self.count_workloads_matching(&WorkloadFilter {
            zone: Some(zone),
            ..Default::default()
        })
    }

    pub fn count_workloads_of_type_in_zone(
        &self,
        workload_type: &str,
        zone: &str,
    ) -> ClusterResult<usize> {
        self.count_workloads_matching(&WorkloadFilter {
            workload_type: Some(workload_type),
            zone: Some(zone),
            scheduled_only: false,
        })
    }

    pub fn count_scheduled_workloads_of_type(&self, workload_type: &str) -> ClusterResult<usize> {
        self.count_workloads_matching(&WorkloadFilter {
            workload_type: Some(workload_type),
            scheduled_only: true,
            ..Default::default()
        })
    }

    pub fn count_scheduled_workloads_in_zone(&self, zone: &str) -> ClusterResult<usize> {
        self.count_workloads_matching(&WorkloadFilter {
            zone: Some(zone),
            scheduled_only: true,
            ..Default::default()
        })
    }

    pub fn count_scheduled_workloads_of_type_in_zone(
        &self,
        workload_type: &str,
        zone: &str,
    ) -> ClusterResult<usize> {
        self.count_workloads_matching(&WorkloadFilter {
            workload_type: Some(workload_type),
            zone: Some(zone),
            scheduled_only: true,
        })
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn free_nodes(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.is_free()).collect()
    }

    pub fn non_allocated_workloads(&self) -> Vec<&Workload> {
        self.workloads.iter().filter(|w| w.is_unallocated()).collect()
    }

    pub fn has_free_nodes(&self) -> bool {
        self.nodes.iter().any(Node::is_free)
    }

    pub fn has_non_allocated_workloads(&self) -> bool {
        self.workloads.iter().any(Workload::is_unallocated)
    }

    /// Scheduled workload count for every recognized type × zone pair.
    pub fn scheduled_type_zone_allocation(&self) -> Vec<ZoneCount> {
        let mut allocation = Vec::with_capacity(self.workload_types.len() * self.zones.len());
        for workload_type in &self.workload_types {
            for zone in &self.zones {
                let count = self
                    .workloads
                    .iter()
                    .filter(|w| {
                        w.is_scheduled() && w.workload_type() == workload_type && w.zone() == zone
                    })
                    .count();
                allocation.push(ZoneCount::new(workload_type, zone, count as u32));
            }
        }
        allocation
    }

    // -------------------------------------------------------------------------
    // Creators
    // -------------------------------------------------------------------------

    /// Provision one free node; the zone is chosen at random when omitted.
    ///
    /// The new id is one past both the highest live id and the highest id
    /// ever issued, so ids of removed nodes are not handed out again.
    pub fn add_node(&mut self, zone: Option<&str>) -> ClusterResult<NodeId> {
        if let Some(zone) = zone {
            self.check_zone(zone)?;
        }
        if self.nodes.len() >= self.max_nodes {
            return Err(ClusterError::NodeLimitReached {
                max_nodes: self.max_nodes,
            });
        }

        let zone = self.resolve_zone(zone)?;
        let highest_live = self
            .nodes
            .iter()
            .map(Node::id)
            .max()
            .unwrap_or(NodeId::new(0));
        let id = highest_live.max(self.last_node_id).next();

        let node = Node::new(id, zone)?;
        debug!(node_id = %id, zone = node.zone(), "Adding node");
        self.nodes.push(node);
        self.last_node_id = id;
        self.add_time(self.time_costs.add_node);
        Ok(id)
    }

    /// Submit one pending workload; the zone is chosen at random when omitted.
    pub fn add_workload(
        &mut self,
        workload_type: &str,
        zone: Option<&str>,
    ) -> ClusterResult<WorkloadId> {
        require_label("workload type", workload_type)?;
        let zone = self.resolve_zone(zone)?;

        let id = self.last_workload_id.next();
        let workload = Workload::new(id, workload_type, zone)?;
        debug!(
            workload_id = %id,
            workload_type,
            zone = workload.zone(),
            "Adding workload"
        );
        self.workloads.push(workload);
        self.last_workload_id = id;
        if !self.workload_types.iter().any(|t| t == workload_type) {
            self.workload_types.push(workload_type.to_string());
        }
        self.add_time(self.time_costs.schedule_workload);
        Ok(id)
    }

    // -------------------------------------------------------------------------
    // Evictors / removers
    // -------------------------------------------------------------------------

    /// Reset every workload on `node_id` to pending. Workloads stay in the
    /// collection. The evict cost is charged once, even when nothing moved.
    pub fn evict_workload_on_node(&mut self, node_id: NodeId) -> usize {
        let mut evicted = 0;
        for workload in self
            .workloads
            .iter_mut()
            .filter(|w| w.node() == Some(node_id))
        {
            debug!(
                workload_id = %workload.id(),
                workload_type = workload.workload_type(),
                zone = workload.zone(),
                node_id = %node_id,
                "Evicted workload"
            );
            workload.evict();
            evicted += 1;
        }

        if evicted == 0 {
            debug!(node_id = %node_id, "No workloads found on node; node already was free");
        }
        self.add_time(self.time_costs.evict_workload);
        evicted
    }

    /// Evict `number` scheduled workloads of `workload_type` in `zone`.
    ///
    /// Selected workloads are deleted from the collection and their nodes
    /// marked free. Duplicate selections collapse, so fewer than `number`
    /// workloads may be removed. Returns the removed ids.
    pub fn evict_workloads_by_type_and_zone(
        &mut self,
        workload_type: &str,
        zone: &str,
        number: usize,
    ) -> ClusterResult<Vec<WorkloadId>> {
        require_label("workload type", workload_type)?;
        require_label("zone", zone)?;

        let candidates: Vec<WorkloadId> = self
            .workloads
            .iter()
            .filter(|w| w.is_busy() && w.workload_type() == workload_type && w.zone() == zone)
            .map(Workload::id)
            .collect();

        if candidates.len() < number {
            return Err(ClusterError::InsufficientCandidates {
                workload_type: workload_type.to_string(),
                zone: zone.to_string(),
                requested: number,
                available: candidates.len(),
            });
        }

        let selected: BTreeSet<WorkloadId> = self
            .heuristics
            .select_for_eviction(&candidates, number)?
            .into_iter()
            .copied()
            .collect();

        // Resolve every node before touching anything.
        let mut hosting = Vec::with_capacity(selected.len());
        for workload in self.workloads.iter().filter(|w| selected.contains(&w.id())) {
            hosting.push(self.resolve_node_index(workload)?);
        }
        for index in hosting {
            self.nodes[index].mark_free();
        }

        let mut removed = Vec::with_capacity(selected.len());
        self.workloads.retain(|w| {
            if !selected.contains(&w.id()) {
                return true;
            }
            debug!(
                workload_id = %w.id(),
                workload_type = w.workload_type(),
                zone = w.zone(),
                "Removed workload"
            );
            removed.push(w.id());
            false
        });

        self.add_time(self.time_costs.evict_workload);
        Ok(removed)
    }

    /// Scale down by `number` randomly chosen nodes.
    ///
    /// Workloads on removed nodes go back to pending (charging the evict cost
    /// per node). Duplicate selections collapse. Returns the removed ids.
    pub fn remove_node(&mut self, number: usize) -> ClusterResult<Vec<NodeId>> {
        if self.nodes.len() < number {
            return Err(ClusterError::InsufficientCapacity {
                requested: number,
                available: self.nodes.len(),
            });
        }

        let ids: Vec<NodeId> = self.nodes.iter().map(Node::id).collect();
        let selected: BTreeSet<NodeId> = self
            .heuristics
            .select_for_removal(&ids, number)?
            .into_iter()
            .copied()
            .collect();

        let mut removed = Vec::with_capacity(selected.len());
        for node_id in ids.into_iter().filter(|id| selected.contains(id)) {
            self.evict_workload_on_node(node_id);
            removed.push(node_id);
        }

        self.nodes.retain_mut(|node| {
            if !selected.contains(&node.id()) {
                return true;
            }
            node.mark_free();
            debug!(node_id = %node.id(), zone = node.zone(), "Removed node");
            false
        });

        self.add_time(self.time_costs.remove_node);
        Ok(removed)
    }

    // -------------------------------------------------------------------------
    // Placement
    // -------------------------------------------------------------------------

    /// One pass over unassigned workloads, placing each on a random free node
    /// in its own zone when one exists. Returns the number placed.
    pub fn update_workload_node_allocation(&mut self) -> ClusterResult<usize> {
        let mut placed = 0;
        for workload in self.workloads.iter_mut().filter(|w| w.node().is_none()) {
            let free: Vec<usize> = self
                .nodes
                .iter()
                .enumerate()
                .filter(|(_, n)| n.is_free() && n.zone() == workload.zone())
                .map(|(i, _)| i)
                .collect();
            if free.is_empty() {
                continue;
            }

            let index = *self.heuristics.select_placement(&free)?;
            let node = &mut self.nodes[index];
            debug!(
                workload_id = %workload.id(),
                workload_type = workload.workload_type(),
                zone = workload.zone(),
                node_id = %node.id(),
                "Allocated workload to node"
            );
            node.mark_busy();
            workload.allocate_to_node(node.id());
            placed += 1;
        }
        Ok(placed)
    }

    // -------------------------------------------------------------------------
    // Consistency
    // -------------------------------------------------------------------------

    /// Check the cross-entity invariants.
    pub fn verify_invariants(&self) -> ClusterResult<()> {
        if self.nodes.len() > self.max_nodes {
            return Err(ClusterError::InvariantViolation(format!(
                "{} nodes exceed max_nodes of {}",
                self.nodes.len(),
                self.max_nodes
            )));
        }

        let mut held = BTreeSet::new();
        for workload in &self.workloads {
            if workload.is_scheduled() != workload.is_busy() {
                return Err(ClusterError::InvariantViolation(format!(
                    "{} is {} but holds node {:?}",
                    workload.id(),
                    workload.state(),
                    workload.node()
                )));
            }
            let Some(node_id) = workload.node() else {
                continue;
            };
            let index = self.resolve_node_index(workload)?;
            if self.nodes[index].is_free() {
                return Err(ClusterError::InvariantViolation(format!(
                    "{} is busy on {node_id}, which is free",
                    workload.id()
                )));
            }
            if !held.insert(node_id) {
                return Err(ClusterError::InvariantViolation(format!(
                    "{node_id} is held by more than one workload"
                )));
            }
        }
        Ok(())
    }

    fn resolve_node_index(&self, workload: &Workload) -> ClusterResult<usize> {
        let node_id = workload.node();
        let mut found = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| Some(n.id()) == node_id)
            .map(|(i, _)| i);
        match (found.next(), found.next()) {
            (Some(index), None) => Ok(index),
            (None, _) => Err(ClusterError::InvariantViolation(format!(
                "{} references node {:?}, which does not exist",
                workload.id(),
                node_id
            ))),
            (Some(_), Some(_)) => Err(ClusterError::InvariantViolation(format!(
                "{} references node {:?}, which resolves to several nodes",
                workload.id(),
                node_id
            ))),
        }
    }

    fn resolve_zone(&mut self, zone: Option<&str>) -> ClusterResult<String> {
        match zone {
            Some(zone) => {
                self.check_zone(zone)?;
                Ok(zone.to_string())
            }
            None => Ok(self.heuristics.select_zone(&self.zones)?.to_string()),
        }
    }

    fn check_zone(&self, zone: &str) -> ClusterResult<()> {
        require_label("zone", zone)?;
        if !self.zones.iter().any(|z| z == zone) {
            return Err(ClusterError::InvalidArgument(format!(
                "unknown availability zone '{zone}'"
            )));
        }
        Ok(())
    }

    fn add_time(&mut self, cost: u64) {
        self.clock = self.clock.saturating_add(cost);
    }
}

impl std::fmt::Display for ClusterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "----- Nodes -----")?;
        for node in &self.nodes {
            writeln!(f, "{node}")?;
        }
        writeln!(f)?;
        writeln!(f, "----- Workloads -----")?;
        for workload in &self.workloads {
            writeln!(f, "{workload}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZoneSpec;
    use crate::workload::WorkloadState;

    fn two_zone_config() -> ClusterConfig {
        ClusterConfig {
            zones: vec![ZoneSpec::new("AZ-1", 2), ZoneSpec::new("AZ-2", 1)],
            initial_workloads: vec![
                ZoneCount::new("A", "AZ-1", 2),
                ZoneCount::new("B", "AZ-2", 2),
            ],
            max_nodes: 5,
            time_costs: TimeCosts::default(),
            sampling: SamplingMode::WithReplacement,
            seed: Some(11),
        }
    }

    #[test]
    fn test_initial_placement() {
        let state = ClusterState::new(&two_zone_config()).unwrap();

        assert_eq!(state.count_nodes(), 3);
        assert_eq!(state.count_workloads(), 4);
        assert_eq!(state.clock(), 0);
        // AZ-2 has one node for two B workloads
        assert_eq!(state.non_allocated_workloads().len(), 1);
        assert!(!state.has_free_nodes());
        assert_eq!(state.workload_types(), ["A", "B"]);
        assert_eq!(state.sampling(), SamplingMode::WithReplacement);
        state.verify_invariants().unwrap();
    }

    #[test]
    fn test_counters() {
        let state = ClusterState::new(&two_zone_config()).unwrap();

        assert_eq!(state.count_workloads_of_type("A").unwrap(), 2);
        assert_eq!(state.count_workloads_in_zone("AZ-2").unwrap(), 2);
        assert_eq!(state.count_workloads_of_type_in_zone("B", "AZ-2").unwrap(), 2);
        assert_eq!(state.count_scheduled_workloads_of_type("B").unwrap(), 1);
        assert_eq!(state.count_scheduled_workloads_in_zone("AZ-1").unwrap(), 2);
        assert_eq!(
            state
                .count_scheduled_workloads_of_type_in_zone("A", "AZ-2")
                .unwrap(),
            0
        );
        assert!(state.count_workloads_of_type("").unwrap_err().is_contract_violation());
    }

    #[test]
    fn test_scheduled_allocation_covers_every_pair() {
        let state = ClusterState::new(&two_zone_config()).unwrap();
        assert_eq!(
            state.scheduled_type_zone_allocation(),
            vec![
                ZoneCount::new("A", "AZ-1", 2),
                ZoneCount::new("A", "AZ-2", 0),
                ZoneCount::new("B", "AZ-1", 0),
                ZoneCount::new("B", "AZ-2", 1),
            ]
        );
    }

    #[test]
    fn test_add_node_charges_time() {
        let mut state = ClusterState::new(&two_zone_config()).unwrap();
        let workloads_before = state.workloads().to_vec();

        let id = state.add_node(Some("AZ-2")).unwrap();

        assert_eq!(id, NodeId::new(4));
        assert_eq!(state.count_nodes(), 4);
        assert_eq!(state.clock(), 600);
        assert!(state.node(id).unwrap().is_free());
        assert_eq!(state.workloads(), workloads_before.as_slice());
    }

    #[test]
    fn test_add_node_rejects_unknown_zone() {
        let mut state = ClusterState::new(&two_zone_config()).unwrap();
        assert!(state.add_node(Some("AZ-9")).unwrap_err().is_contract_violation());
        assert_eq!(state.count_nodes(), 3);
        assert_eq!(state.clock(), 0);
    }

    #[test]
    fn test_add_node_at_limit() {
        let mut state = ClusterState::new(&two_zone_config()).unwrap();
        state.add_node(None).unwrap();
        state.add_node(None).unwrap();
        assert_eq!(
            state.add_node(None).unwrap_err(),
            ClusterError::NodeLimitReached { max_nodes: 5 }
        );
    }

    #[test]
    fn test_add_node_checks_zone_before_limit() {
        let mut state = ClusterState::new(&two_zone_config()).unwrap();
        state.add_node(None).unwrap();
        state.add_node(None).unwrap();

        assert!(state.add_node(Some("")).unwrap_err().is_contract_violation());
        assert!(state.add_node(Some("AZ-9")).unwrap_err().is_contract_violation());
        assert_eq!(
            state.add_node(Some("AZ-1")).unwrap_err(),
            ClusterError::NodeLimitReached { max_nodes: 5 }
        );
        assert_eq!(state.count_nodes(), 5);
    }

    #[test]
    fn test_removed_node_id_not_reissued() {
        let mut state = ClusterState::new(&two_zone_config()).unwrap();
        let added = state.add_node(Some("AZ-1")).unwrap();
        while state.node(added).is_some() {
            state.remove_node(1).unwrap();
        }
        let next = state.add_node(Some("AZ-1")).unwrap();
        assert!(next > added);
    }

    #[test]
    fn test_add_workload() {
        let mut state = ClusterState::new(&two_zone_config()).unwrap();

        let id = state.add_workload("C", Some("AZ-1")).unwrap();

        assert_eq!(id, WorkloadId::new(5));
        assert_eq!(state.clock(), 30);
        assert_eq!(state.workload(id).unwrap().state(), WorkloadState::Pending);
        assert_eq!(state.workload_types(), ["A", "B", "C"]);
        assert!(state.add_workload("", None).is_err());
    }

    #[test]
    fn test_deleted_workload_id_not_reissued() {
        let mut state = ClusterState::new(&two_zone_config()).unwrap();
        let highest = state.add_workload("C", Some("AZ-1")).unwrap();
        state.add_node(Some("AZ-1")).unwrap();
        state.update_workload_node_allocation().unwrap();
        assert!(state.workload(highest).unwrap().is_scheduled());

        let removed = state.evict_workloads_by_type_and_zone("C", "AZ-1", 1).unwrap();
        assert_eq!(removed, vec![highest]);

        let next = state.add_workload("C", Some("AZ-1")).unwrap();
        assert!(next > highest);
        assert_eq!(next, WorkloadId::new(6));
    }

    fn full_single_zone_config(seed: u64) -> ClusterConfig {
        ClusterConfig {
            zones: vec![ZoneSpec::new("AZ-1", 5)],
            initial_workloads: vec![ZoneCount::new("A", "AZ-1", 5)],
            max_nodes: 5,
            time_costs: TimeCosts::default(),
            sampling: SamplingMode::WithReplacement,
            seed: Some(seed),
        }
    }

    #[test]
    fn test_repeated_eviction_picks_collapse() {
        let mut collapsed = 0;
        for seed in 0..40 {
            let mut state = ClusterState::new(&full_single_zone_config(seed)).unwrap();

            let removed = state.evict_workloads_by_type_and_zone("A", "AZ-1", 3).unwrap();

            assert!((1..=3).contains(&removed.len()));
            let distinct: BTreeSet<_> = removed.iter().collect();
            assert_eq!(distinct.len(), removed.len());
            assert_eq!(state.count_workloads(), 5 - removed.len());
            assert_eq!(state.free_nodes().len(), removed.len());
            // charged once per call, however many were picked
            assert_eq!(state.clock(), 30);
            state.verify_invariants().unwrap();
            if removed.len() < 3 {
                collapsed += 1;
            }
        }
        assert!(collapsed > 0);
    }

    #[test]
    fn test_repeated_removal_picks_collapse() {
        let mut collapsed = 0;
        for seed in 0..40 {
            let mut state = ClusterState::new(&full_single_zone_config(seed)).unwrap();

            let removed = state.remove_node(3).unwrap();

            assert!((1..=3).contains(&removed.len()));
            assert_eq!(state.count_nodes(), 5 - removed.len());
            assert_eq!(state.count_workloads(), 5);
            assert_eq!(state.non_allocated_workloads().len(), removed.len());
            assert_eq!(state.clock(), removed.len() as u64 * 30 + 120);
            state.verify_invariants().unwrap();
            if removed.len() < 3 {
                collapsed += 1;
            }
        }
        assert!(collapsed > 0);
    }

    #[test]
    fn test_evict_workload_on_node_resets_in_place() {
        let mut state = ClusterState::new(&two_zone_config()).unwrap();
        let node_id = state.workloads()[0].node().unwrap();

        assert_eq!(state.evict_workload_on_node(node_id), 1);
        assert_eq!(state.count_workloads(), 4);
        assert!(state.workloads()[0].is_unallocated());
        assert_eq!(state.clock(), 30);

        // Nothing left on it, still charged.
        assert_eq!(state.evict_workload_on_node(node_id), 0);
        assert_eq!(state.clock(), 60);
    }

    #[test]
    fn test_evict_by_type_and_zone_deletes() {
        let mut state = ClusterState::new(&two_zone_config()).unwrap();

        let removed = state.evict_workloads_by_type_and_zone("B", "AZ-2", 1).unwrap();

        assert_eq!(removed.len(), 1);
        assert!(state.workload(removed[0]).is_none());
        assert_eq!(state.count_workloads(), 3);
        assert!(state.has_free_nodes());
        assert_eq!(state.clock(), 30);
        state.verify_invariants().unwrap();
    }

    #[test]
    fn test_evict_more_than_scheduled_leaves_state() {
        let mut state = ClusterState::new(&two_zone_config()).unwrap();
        let before = state.snapshot();

        let err = state
            .evict_workloads_by_type_and_zone("B", "AZ-2", 2)
            .unwrap_err();

        assert!(err.is_capacity_error());
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_remove_node_insufficient_capacity() {
        let mut state = ClusterState::new(&two_zone_config()).unwrap();
        let before = state.snapshot();

        assert_eq!(
            state.remove_node(4).unwrap_err(),
            ClusterError::InsufficientCapacity {
                requested: 4,
                available: 3
            }
        );
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_remove_node_charges_stacked_costs() {
        let mut state = ClusterState::new(&two_zone_config()).unwrap();

        let removed = state.remove_node(1).unwrap();

        assert_eq!(removed.len(), 1);
        assert_eq!(state.count_nodes(), 2);
        // one evict per removed node plus the removal itself
        assert_eq!(state.clock(), 30 + 120);
        state.verify_invariants().unwrap();
    }

    #[test]
    fn test_placement_without_matching_zone_is_noop() {
        let mut state = ClusterState::new(&two_zone_config()).unwrap();
        state.add_node(Some("AZ-1")).unwrap();
        let before = state.snapshot();

        // The pending B workload lives in AZ-2; the only free node is in AZ-1.
        assert_eq!(state.update_workload_node_allocation().unwrap(), 0);
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_display_lists_entities() {
        let state = ClusterState::new(&two_zone_config()).unwrap();
        let rendered = state.to_string();
        assert!(rendered.starts_with("----- Nodes -----\nnode-1"));
        assert!(rendered.contains("----- Workloads -----\nwl-1"));
    }
}
