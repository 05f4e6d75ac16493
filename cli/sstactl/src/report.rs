//! Per-trial rows and batch summaries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ssta_cluster::{TrialOutcome, TrialResult};
use tabled::Tabled;

/// One table row per trial.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct TrialRow {
    #[tabled(rename = "Trial")]
    pub trial: usize,

    #[tabled(rename = "Seed")]
    pub seed: u64,

    #[tabled(rename = "Outcome")]
    pub outcome: String,

    #[tabled(rename = "Steps")]
    pub steps: u64,

    #[tabled(rename = "Nodes")]
    pub nodes: usize,

    #[tabled(rename = "Workloads")]
    pub workloads: usize,

    #[tabled(rename = "Sim. time")]
    pub clock: u64,
}

impl From<&TrialResult> for TrialRow {
    fn from(result: &TrialResult) -> Self {
        let outcome = match &result.outcome {
            TrialOutcome::Converged => "converged".to_string(),
            TrialOutcome::StepLimitReached => "step limit".to_string(),
            TrialOutcome::Failed { error } => format!("failed: {error}"),
        };
        Self {
            trial: result.trial,
            seed: result.seed,
            outcome,
            steps: result.steps,
            nodes: result.nodes,
            workloads: result.workloads,
            clock: result.clock,
        }
    }
}

/// Aggregate over a batch of trials.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct Summary {
    #[tabled(rename = "Trials")]
    pub trials: usize,

    #[tabled(rename = "Converged")]
    pub converged: usize,

    #[tabled(rename = "Failed")]
    pub failed: usize,

    /// Steps to convergence, over converged trials only.
    #[tabled(rename = "Min steps", display = "display_option")]
    pub min_steps: Option<u64>,

    #[tabled(rename = "Mean steps", display = "display_mean")]
    pub mean_steps: Option<f64>,

    #[tabled(rename = "Max steps", display = "display_option")]
    pub max_steps: Option<u64>,

    #[tabled(rename = "Mean nodes", display = "display_mean")]
    pub mean_nodes: Option<f64>,

    #[tabled(rename = "Mean sim. time", display = "display_mean")]
    pub mean_clock: Option<f64>,
}

fn display_option(value: &Option<u64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn display_mean(value: &Option<f64>) -> String {
    value
        .map(|v| format!("{v:.1}"))
        .unwrap_or_else(|| "-".to_string())
}

fn mean(values: impl Iterator<Item = u64>) -> Option<f64> {
    let (sum, count) = values.fold((0u64, 0u64), |(sum, count), v| {
        (sum.saturating_add(v), count + 1)
    });
    (count > 0).then(|| sum as f64 / count as f64)
}

impl Summary {
    pub fn from_results(results: &[TrialResult]) -> Self {
        let converged: Vec<&TrialResult> = results.iter().filter(|r| r.converged()).collect();
        let steps = || converged.iter().map(|r| r.steps);

        Self {
            trials: results.len(),
            converged: converged.len(),
            failed: results
                .iter()
                .filter(|r| matches!(r.outcome, TrialOutcome::Failed { .. }))
                .count(),
            min_steps: steps().min(),
            mean_steps: mean(steps()),
            max_steps: steps().max(),
            mean_nodes: mean(results.iter().map(|r| r.nodes as u64)),
            mean_clock: mean(results.iter().map(|r| r.clock)),
        }
    }

    pub fn all_converged(&self) -> bool {
        self.converged == self.trials
    }
}

/// Everything a run writes to `results.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub base_seed: u64,
    pub max_steps: u64,
    pub summary: Summary,
    pub results: Vec<TrialResult>,
}

impl RunReport {
    pub fn new(base_seed: u64, max_steps: u64, results: Vec<TrialResult>) -> Self {
        Self {
            generated_at: Utc::now(),
            base_seed,
            max_steps,
            summary: Summary::from_results(&results),
            results,
        }
    }

    pub fn rows(&self) -> Vec<TrialRow> {
        self.results.iter().map(TrialRow::from).collect()
    }
}
