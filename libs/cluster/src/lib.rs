//! # ssta-cluster
//!
//! Discrete-step simulation of a cluster scheduler and a node autoscaler
//! converging on a target workload distribution.
//!
//! ## Model
//!
//! - **Nodes** live in availability zones and are either free or busy.
//! - **Workloads** have a type and a zone, and occupy at most one node in
//!   that zone.
//! - **Target**: desired scheduled count per (type, zone).
//!
//! Each [`IterationDriver::step`] evicts surplus workloads, places pending
//! ones, then adds or removes at most one node. A step reporting nothing to do
//! on either side marks the fixed point.
//!
//! All random choices go through [`Heuristics`], seeded per run, so a trial is
//! reproducible from its seed.

pub mod config;
pub mod driver;
pub mod error;
pub mod heuristics;
pub mod node;
pub mod state;
pub mod trial;
pub mod workload;

pub use config::{ClusterConfig, TimeCosts, ZoneSpec};
pub use driver::{IterationDriver, NodeAction, StepOutcome};
pub use error::{ClusterError, ClusterResult};
pub use heuristics::{Heuristics, SamplingMode};
pub use node::{Node, NodeState};
pub use state::{ClusterSnapshot, ClusterState, WorkloadFilter};
pub use trial::{run_trial, trial_seed, TrialOutcome, TrialResult};
pub use workload::{Workload, WorkloadState};
