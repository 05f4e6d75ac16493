//! Repeated-step trials.
//!
//! A trial clones an initial state, reseeds it, and steps it with a driver
//! until the step reports done, the step ceiling is hit, or a step fails.

use serde::{Deserialize, Serialize};
use ssta_reconcile::ConvergenceStatus;
use tracing::{info, instrument, warn};

use crate::driver::{IterationDriver, StepOutcome};
use crate::state::ClusterState;

/// How a trial ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TrialOutcome {
    /// A step reported nothing left to do.
    Converged,

    /// The step ceiling was reached first.
    StepLimitReached,

    /// A step or the observer returned an error.
    Failed { error: String },
}

/// Summary of one trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial: usize,
    pub seed: u64,
    #[serde(flatten)]
    pub outcome: TrialOutcome,

    /// Index of the step that ended the trial; for a converged trial, the
    /// number of productive steps before the fixed point was observed.
    pub steps: u64,

    /// Final node count.
    pub nodes: usize,

    /// Final workload count.
    pub workloads: usize,

    /// Final simulated clock.
    pub clock: u64,
}

impl TrialResult {
    pub fn converged(&self) -> bool {
        self.outcome == TrialOutcome::Converged
    }

    pub fn status(&self) -> ConvergenceStatus {
        match self.outcome {
            TrialOutcome::Converged => ConvergenceStatus::Converged,
            TrialOutcome::StepLimitReached => ConvergenceStatus::Converging,
            TrialOutcome::Failed { .. } => ConvergenceStatus::Diverged,
        }
    }
}

/// Per-trial seed derived from a base seed.
pub fn trial_seed(base: u64, trial: usize) -> u64 {
    base.wrapping_add(trial as u64)
}

/// Run one trial on a copy of `initial`.
///
/// `observer` sees the state after every step; an observer error ends the
/// trial as failed.
#[instrument(skip(initial, driver, observer))]
pub fn run_trial<F, E>(
    initial: &ClusterState,
    driver: &IterationDriver,
    trial: usize,
    seed: u64,
    max_steps: u64,
    mut observer: F,
) -> TrialResult
where
    F: FnMut(&ClusterState, &StepOutcome) -> Result<(), E>,
    E: std::fmt::Display,
{
    let mut state = initial.clone();
    state.reseed(seed);

    let mut outcome = TrialOutcome::StepLimitReached;
    let mut steps = max_steps;
    for iteration in 0..max_steps {
        let step = match driver.step(&mut state, iteration) {
            Ok(step) => step,
            Err(e) => {
                warn!(trial, iteration, error = %e, "Step failed");
                outcome = TrialOutcome::Failed {
                    error: e.to_string(),
                };
                steps = iteration;
                break;
            }
        };

        if let Err(e) = observer(&state, &step) {
            warn!(trial, iteration, error = %e, "Step observer failed");
            outcome = TrialOutcome::Failed {
                error: e.to_string(),
            };
            steps = iteration;
            break;
        }

        if step.is_done() {
            outcome = TrialOutcome::Converged;
            steps = iteration;
            break;
        }
    }

    info!(
        trial,
        steps,
        nodes = state.count_nodes(),
        clock = state.clock(),
        outcome = ?outcome,
        "Trial finished"
    );

    TrialResult {
        trial,
        seed,
        outcome,
        steps,
        nodes: state.count_nodes(),
        workloads: state.count_workloads(),
        clock: state.clock(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClusterConfig, TimeCosts, ZoneSpec};
    use crate::heuristics::SamplingMode;
    use ssta_reconcile::ZoneCount;
    use std::convert::Infallible;

    fn pending_config() -> ClusterConfig {
        ClusterConfig {
            zones: vec![ZoneSpec::new("AZ-1", 1)],
            initial_workloads: vec![ZoneCount::new("A", "AZ-1", 2)],
            max_nodes: 3,
            time_costs: TimeCosts::default(),
            sampling: SamplingMode::WithReplacement,
            seed: Some(1),
        }
    }

    fn driver() -> IterationDriver {
        IterationDriver::new(vec![ZoneCount::new("A", "AZ-1", 2)]).unwrap()
    }

    fn no_observer(_: &ClusterState, _: &StepOutcome) -> Result<(), Infallible> {
        Ok(())
    }

    #[test]
    fn test_trial_converges() {
        let initial = ClusterState::new(&pending_config()).unwrap();

        let result = run_trial(&initial, &driver(), 0, 42, 100, no_observer);

        assert!(result.converged());
        assert_eq!(result.steps, 2);
        assert_eq!(result.nodes, 2);
        assert_eq!(result.clock, 600);
        // The initial state is left untouched.
        assert_eq!(initial.count_nodes(), 1);
    }

    #[test]
    fn test_step_ceiling() {
        let initial = ClusterState::new(&pending_config()).unwrap();

        let result = run_trial(&initial, &driver(), 3, 42, 1, no_observer);

        assert_eq!(result.outcome, TrialOutcome::StepLimitReached);
        assert_eq!(result.status(), ConvergenceStatus::Converging);
        assert_eq!(result.steps, 1);
    }

    #[test]
    fn test_observer_failure_ends_trial() {
        let initial = ClusterState::new(&pending_config()).unwrap();
        let mut calls = 0;

        let result = run_trial(&initial, &driver(), 0, 42, 100, |_, _| {
            calls += 1;
            Err("disk full")
        });

        assert_eq!(calls, 1);
        assert_eq!(
            result.outcome,
            TrialOutcome::Failed {
                error: "disk full".into()
            }
        );
        assert_eq!(result.status(), ConvergenceStatus::Diverged);
    }

    #[test]
    fn test_result_serialization_is_flat() {
        let result = TrialResult {
            trial: 1,
            seed: 9,
            outcome: TrialOutcome::Converged,
            steps: 4,
            nodes: 12,
            workloads: 13,
            clock: 900,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"], "converged");
        assert_eq!(json["steps"], 4);
    }

    #[test]
    fn test_trial_seed() {
        assert_eq!(trial_seed(10, 3), 13);
        assert_eq!(trial_seed(u64::MAX, 1), 0);
    }
}
