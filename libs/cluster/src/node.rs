//! Compute nodes.

use serde::{Deserialize, Serialize};
use ssta_id::NodeId;

use crate::error::{require_label, ClusterResult};

/// Occupancy of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Free,
    Busy,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeState::Free => write!(f, "free"),
            NodeState::Busy => write!(f, "busy"),
        }
    }
}

/// A compute slot in one availability zone.
///
/// A node does not know which workload it hosts; that relation lives on the
/// workload side only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    zone: String,
    state: NodeState,
}

impl Node {
    /// Create a free node.
    pub fn new(id: NodeId, zone: impl Into<String>) -> ClusterResult<Self> {
        let zone = zone.into();
        require_label("zone", &zone)?;
        Ok(Self {
            id,
            zone,
            state: NodeState::Free,
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn is_free(&self) -> bool {
        self.state == NodeState::Free
    }

    pub fn mark_free(&mut self) {
        self.state = NodeState::Free;
    }

    pub fn mark_busy(&mut self) {
        self.state = NodeState::Busy;
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - zone: {} - state: {}", self.id, self.zone, self.state)
    }
}
