//! Workloads scheduled onto nodes.

use serde::{Deserialize, Serialize};
use ssta_id::{NodeId, WorkloadId};

use crate::error::{require_label, ClusterResult};

/// Occupancy of a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadState {
    Pending,
    Busy,
}

impl std::fmt::Display for WorkloadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkloadState::Pending => write!(f, "pending"),
            WorkloadState::Busy => write!(f, "busy"),
        }
    }
}

/// A unit of work of a given type, pinned to one availability zone.
///
/// `node` is set exactly when the workload is busy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    id: WorkloadId,
    #[serde(rename = "type")]
    workload_type: String,
    zone: String,
    state: WorkloadState,
    node: Option<NodeId>,
}

impl Workload {
    /// Create a pending, unassigned workload.
    pub fn new(
        id: WorkloadId,
        workload_type: impl Into<String>,
        zone: impl Into<String>,
    ) -> ClusterResult<Self> {
        let workload_type = workload_type.into();
        let zone = zone.into();
        require_label("workload type", &workload_type)?;
        require_label("zone", &zone)?;
        Ok(Self {
            id,
            workload_type,
            zone,
            state: WorkloadState::Pending,
            node: None,
        })
    }

    pub fn id(&self) -> WorkloadId {
        self.id
    }

    pub fn workload_type(&self) -> &str {
        &self.workload_type
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn state(&self) -> WorkloadState {
        self.state
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Whether the workload currently holds a node.
    pub fn is_scheduled(&self) -> bool {
        self.node.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.state == WorkloadState::Busy
    }

    /// Pending and without a node.
    pub fn is_unallocated(&self) -> bool {
        self.state == WorkloadState::Pending && self.node.is_none()
    }

    pub fn allocate_to_node(&mut self, node: NodeId) {
        self.node = Some(node);
        self.state = WorkloadState::Busy;
    }

    pub fn evict(&mut self) {
        self.node = None;
        self.state = WorkloadState::Pending;
    }
}

impl std::fmt::Display for Workload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let node = self
            .node
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{}\ttype: {}\tzone: {}\tnode: {}\tstate: {}",
            self.id, self.workload_type, self.zone, node, self.state
        )
    }
}
