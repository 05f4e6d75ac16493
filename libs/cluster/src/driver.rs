//! One discrete simulation step.
//!
//! A step runs two phases, always in this order:
//!
//! 1. **Workloads**: diff the scheduled distribution against the target.
//!    Over-provisioned (type, zone) pairs are evicted first; then, if any pair
//!    is under-provisioned and a free node exists, one global placement pass
//!    runs. The phase is done when the diff was empty to begin with.
//! 2. **Nodes**: with unallocated workloads and room under the cap, add one
//!    node; otherwise, with a free node, remove one node. The phase is done
//!    when the node count did not change.
//!
//! The driver enforces no step ceiling; callers repeat `step` until
//! [`StepOutcome::is_done`] or their own budget runs out.

use serde::{Deserialize, Serialize};
use ssta_id::{NodeId, WorkloadId};
use ssta_reconcile::{allocation_diff, AllocationDelta, ConvergenceStatus, ZoneCount};
use tracing::{debug, info, instrument};

use crate::error::ClusterResult;
use crate::state::ClusterState;

/// Node-count change made by the scaling phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NodeAction {
    None,
    Added { node_id: NodeId },
    Removed { node_ids: Vec<NodeId> },
}

impl NodeAction {
    pub fn is_change(&self) -> bool {
        !matches!(self, NodeAction::None)
    }
}

impl std::fmt::Display for NodeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeAction::None => write!(f, "-"),
            NodeAction::Added { node_id } => write!(f, "added {node_id}"),
            NodeAction::Removed { node_ids } => {
                let ids: Vec<String> = node_ids.iter().map(ToString::to_string).collect();
                write!(f, "removed {}", ids.join(","))
            }
        }
    }
}

/// What one step observed and did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Caller-supplied step index.
    pub iteration: u64,

    /// Diff computed at the start of the workload phase.
    pub diff: Vec<AllocationDelta>,

    /// Workloads deleted by type/zone eviction.
    pub evicted: Vec<WorkloadId>,

    /// Workloads placed by the placement pass.
    pub placed: usize,

    /// Node-count change.
    pub node_action: NodeAction,

    pub workloads_done: bool,
    pub nodes_done: bool,
}

impl StepOutcome {
    /// Nothing was left to do: the fixed point is reached.
    pub fn is_done(&self) -> bool {
        self.workloads_done && self.nodes_done
    }

    pub fn status(&self) -> ConvergenceStatus {
        if self.is_done() {
            ConvergenceStatus::Converged
        } else {
            ConvergenceStatus::Converging
        }
    }
}

struct WorkloadPhase {
    diff: Vec<AllocationDelta>,
    evicted: Vec<WorkloadId>,
    placed: usize,
}

/// Drives a cluster state toward a target distribution.
#[derive(Debug, Clone)]
pub struct IterationDriver {
    target: Vec<ZoneCount>,
}

impl IterationDriver {
    /// Create a driver; the target must not repeat a (type, zone) key.
    pub fn new(target: Vec<ZoneCount>) -> ClusterResult<Self> {
        allocation_diff(&[], &target)?;
        Ok(Self { target })
    }

    pub fn target(&self) -> &[ZoneCount] {
        &self.target
    }

    /// Run one step against `state`.
    #[instrument(skip(self, state))]
    pub fn step(&self, state: &mut ClusterState, iteration: u64) -> ClusterResult<StepOutcome> {
        let workloads = self.update_workloads(state, iteration)?;
        let node_action = self.update_nodes(state, iteration)?;

        let outcome = StepOutcome {
            iteration,
            workloads_done: workloads.diff.is_empty(),
            nodes_done: !node_action.is_change(),
            diff: workloads.diff,
            evicted: workloads.evicted,
            placed: workloads.placed,
            node_action,
        };

        info!(
            iteration,
            workloads_done = outcome.workloads_done,
            nodes_done = outcome.nodes_done,
            clock = state.clock(),
            "Step complete"
        );
        debug!(iteration, "Cluster after step:\n{state}");

        Ok(outcome)
    }

    fn update_workloads(
        &self,
        state: &mut ClusterState,
        iteration: u64,
    ) -> ClusterResult<WorkloadPhase> {
        let diff = allocation_diff(&state.scheduled_type_zone_allocation(), &self.target)?;
        let mut phase = WorkloadPhase {
            diff: Vec::new(),
            evicted: Vec::new(),
            placed: 0,
        };
        if diff.is_empty() {
            return Ok(phase);
        }

        let rendered: Vec<String> = diff.iter().map(ToString::to_string).collect();
        info!(iteration, diff = %rendered.join(" "), "Differences detected");

        for delta in diff.iter().filter(|d| d.is_over_provisioned()) {
            info!(
                iteration,
                workload_type = %delta.workload_type,
                zone = %delta.zone,
                excess = delta.magnitude(),
                "Too many workloads scheduled; evicting"
            );
            let evicted = state.evict_workloads_by_type_and_zone(
                &delta.workload_type,
                &delta.zone,
                delta.magnitude(),
            )?;
            phase.evicted.extend(evicted);
        }

        if diff.iter().any(AllocationDelta::is_under_provisioned) && state.has_free_nodes() {
            info!(iteration, "Trying to allocate pending workloads");
            phase.placed = state.update_workload_node_allocation()?;
        }

        phase.diff = diff;
        Ok(phase)
    }

    fn update_nodes(&self, state: &mut ClusterState, iteration: u64) -> ClusterResult<NodeAction> {
        if state.has_non_allocated_workloads() && state.count_nodes() < state.max_nodes() {
            let node_id = state.add_node(None)?;
            info!(iteration, node_id = %node_id, "Added a node");
            return Ok(NodeAction::Added { node_id });
        }

        if state.has_free_nodes() {
            let node_ids = state.remove_node(1)?;
            info!(iteration, removed = node_ids.len(), "Removed a node");
            return Ok(NodeAction::Removed { node_ids });
        }

        Ok(NodeAction::None)
    }
}
