//! Allocation reconciliation primitives.
//!
//! This library compares the live distribution of scheduled workloads with a
//! declared target distribution. Key concepts:
//!
//! - **Target allocation**: how many workloads of each type should be
//!   scheduled in each availability zone.
//! - **Current allocation**: how many actually are scheduled right now.
//! - **Delta**: the signed difference per (type, zone); positive means more
//!   must be scheduled, negative means some must be evicted.
//!
//! # Invariants
//!
//! - `allocation_diff` is pure and deterministic (output is sorted)
//! - Each (type, zone) key appears at most once per allocation list
//! - A delta of zero is never reported

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reconciliation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// More than one entry shares the same (type, zone) key.
    #[error("duplicate allocation for type '{workload_type}' in zone '{zone}'")]
    DuplicateAllocation { workload_type: String, zone: String },
}

/// Scheduled (or desired) workload count for one (type, zone) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneCount {
    /// Workload type label (e.g. "A").
    #[serde(rename = "type")]
    pub workload_type: String,

    /// Availability zone label.
    pub zone: String,

    /// Number of workloads.
    pub count: u32,
}

impl ZoneCount {
    /// Create a new zone count.
    pub fn new(workload_type: impl Into<String>, zone: impl Into<String>, count: u32) -> Self {
        Self {
            workload_type: workload_type.into(),
            zone: zone.into(),
            count,
        }
    }

    fn matches(&self, workload_type: &str, zone: &str) -> bool {
        self.workload_type == workload_type && self.zone == zone
    }
}

/// Signed difference between target and current for one (type, zone) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AllocationDelta {
    /// Workload type label.
    #[serde(rename = "type")]
    pub workload_type: String,

    /// Availability zone label.
    pub zone: String,

    /// `target - current`.
    pub diff: i64,
}

impl AllocationDelta {
    /// Create a new delta.
    pub fn new(workload_type: impl Into<String>, zone: impl Into<String>, diff: i64) -> Self {
        Self {
            workload_type: workload_type.into(),
            zone: zone.into(),
            diff,
        }
    }

    /// Fewer workloads are scheduled than desired.
    pub fn is_under_provisioned(&self) -> bool {
        self.diff > 0
    }

    /// More workloads are scheduled than desired.
    pub fn is_over_provisioned(&self) -> bool {
        self.diff < 0
    }

    /// Absolute size of the difference.
    pub fn magnitude(&self) -> usize {
        self.diff.unsigned_abs() as usize
    }
}

impl std::fmt::Display for AllocationDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}:{:+}", self.workload_type, self.zone, self.diff)
    }
}

/// Convergence status of a simulated cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceStatus {
    /// Current matches target and no node changes are pending.
    Converged,

    /// Work remains (current is moving toward target).
    Converging,

    /// The run failed and can no longer converge.
    Diverged,
}

impl ConvergenceStatus {
    /// Returns true if the cluster has converged.
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }

    /// Returns true if the cluster is still converging.
    pub fn is_converging(&self) -> bool {
        matches!(self, Self::Converging)
    }
}

/// Compute the deltas required to move `current` to `target`.
///
/// Every key present on either side yields `target - current`, with a
/// missing entry counted as zero. Entries with a zero delta are dropped.
pub fn allocation_diff(
    current: &[ZoneCount],
    target: &[ZoneCount],
) -> Result<Vec<AllocationDelta>, ReconcileError> {
    ensure_unique(current)?;
    ensure_unique(target)?;

    // Both passes can derive the same delta; the set collapses them.
    let mut deltas = BTreeSet::new();

    for wanted in target {
        let have = find_count(current, &wanted.workload_type, &wanted.zone)?;
        deltas.insert(AllocationDelta::new(
            &wanted.workload_type,
            &wanted.zone,
            i64::from(wanted.count) - i64::from(have),
        ));
    }

    for have in current {
        let wanted = find_count(target, &have.workload_type, &have.zone)?;
        deltas.insert(AllocationDelta::new(
            &have.workload_type,
            &have.zone,
            i64::from(wanted) - i64::from(have.count),
        ));
    }

    Ok(deltas.into_iter().filter(|d| d.diff != 0).collect())
}

/// Sum of all counts in an allocation list.
pub fn total_count(allocations: &[ZoneCount]) -> u64 {
    allocations.iter().map(|a| u64::from(a.count)).sum()
}

fn find_count(
    allocations: &[ZoneCount],
    workload_type: &str,
    zone: &str,
) -> Result<u32, ReconcileError> {
    let mut found = allocations.iter().filter(|a| a.matches(workload_type, zone));
    match (found.next(), found.next()) {
        (None, _) => Ok(0),
        (Some(allocation), None) => Ok(allocation.count),
        (Some(_), Some(_)) => Err(duplicate(workload_type, zone)),
    }
}

fn ensure_unique(allocations: &[ZoneCount]) -> Result<(), ReconcileError> {
    let mut seen = BTreeSet::new();
    for allocation in allocations {
        if !seen.insert((allocation.workload_type.as_str(), allocation.zone.as_str())) {
            return Err(duplicate(&allocation.workload_type, &allocation.zone));
        }
    }
    Ok(())
}

fn duplicate(workload_type: &str, zone: &str) -> ReconcileError {
    ReconcileError::DuplicateAllocation {
        workload_type: workload_type.to_string(),
        zone: zone.to_string(),
    }
}
