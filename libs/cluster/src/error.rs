//! Error types for the cluster simulation.

use ssta_reconcile::ReconcileError;
use thiserror::Error;

/// Result type for cluster operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors that can occur while mutating or querying the cluster state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClusterError {
    /// An argument violated the operation's contract (e.g. an empty label).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The cluster configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Fewer eligible workloads exist than were requested for eviction.
    #[error(
        "cannot evict {requested} workloads of type '{workload_type}' in zone '{zone}': only {available} scheduled"
    )]
    InsufficientCandidates {
        workload_type: String,
        zone: String,
        requested: usize,
        available: usize,
    },

    /// Fewer nodes exist than were requested for removal.
    #[error("cannot remove {requested} nodes: only {available} exist")]
    InsufficientCapacity { requested: usize, available: usize },

    /// The node pool is already at its configured ceiling.
    #[error("node limit of {max_nodes} reached")]
    NodeLimitReached { max_nodes: usize },

    /// A selection policy was handed nothing to choose from.
    #[error("{policy} heuristic received an empty candidate set")]
    EmptyCandidateSet { policy: &'static str },

    /// The current or target allocation is malformed.
    #[error(transparent)]
    Allocation(#[from] ReconcileError),

    /// Cross-entity consistency is broken (fatal to the run).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl ClusterError {
    /// Returns true if the caller passed arguments outside the contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            ClusterError::InvalidArgument(_) | ClusterError::InvalidConfig(_)
        )
    }

    /// Returns true if the operation asked for more than the cluster holds.
    pub fn is_capacity_error(&self) -> bool {
        matches!(
            self,
            ClusterError::InsufficientCandidates { .. }
                | ClusterError::InsufficientCapacity { .. }
                | ClusterError::NodeLimitReached { .. }
        )
    }

    pub(crate) fn empty_label(field: &str) -> Self {
        ClusterError::InvalidArgument(format!("{field} must be a non-empty string"))
    }
}

/// Reject empty labels at the call boundary.
pub(crate) fn require_label(field: &str, value: &str) -> ClusterResult<()> {
    if value.trim().is_empty() {
        return Err(ClusterError::empty_label(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ClusterError::InvalidArgument("x".into()).is_contract_violation());
        assert!(ClusterError::InsufficientCapacity {
            requested: 2,
            available: 1
        }
        .is_capacity_error());
        assert!(!ClusterError::EmptyCandidateSet { policy: "placement" }.is_capacity_error());
    }

    #[test]
    fn test_require_label() {
        assert!(require_label("zone", "AZ-1").is_ok());
        assert!(require_label("zone", "  ").unwrap_err().is_contract_violation());
    }

    #[test]
    fn test_reconcile_error_converts() {
        let err: ClusterError = ReconcileError::DuplicateAllocation {
            workload_type: "A".into(),
            zone: "AZ-1".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "duplicate allocation for type 'A' in zone 'AZ-1'"
        );
    }
}
