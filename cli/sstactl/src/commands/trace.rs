//! Step-by-step view of a single trial.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use ssta_cluster::{run_trial, ClusterState, IterationDriver, StepOutcome, TrialResult};
use tabled::Tabled;

use crate::error::CliError;
use crate::output::{print_info, print_output, print_single, OutputFormat};

use super::{resolve_seed, CommandContext};

#[derive(Debug, Args)]
pub struct TraceCommand {
    /// Seed for the trial.
    #[arg(long)]
    seed: Option<u64>,

    /// Step ceiling (overrides the scenario).
    #[arg(long)]
    max_steps: Option<u64>,

    /// Print the full node and workload listing after the trial.
    #[arg(long)]
    show_state: bool,
}

/// One row per step.
#[derive(Debug, Clone, Serialize, Tabled)]
struct StepRow {
    #[tabled(rename = "Step")]
    iteration: u64,

    #[tabled(rename = "Diff")]
    diff: String,

    #[tabled(rename = "Evicted")]
    evicted: usize,

    #[tabled(rename = "Placed")]
    placed: usize,

    #[tabled(rename = "Nodes")]
    node_action: String,

    #[tabled(rename = "Node count")]
    nodes: usize,

    #[tabled(rename = "Pending")]
    pending: usize,

    #[tabled(rename = "Sim. time")]
    clock: u64,
}

impl StepRow {
    fn new(state: &ClusterState, step: &StepOutcome) -> Self {
        let diff = if step.diff.is_empty() {
            "-".to_string()
        } else {
            step.diff
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        };
        Self {
            iteration: step.iteration,
            diff,
            evicted: step.evicted.len(),
            placed: step.placed,
            node_action: step.node_action.to_string(),
            nodes: state.count_nodes(),
            pending: state.non_allocated_workloads().len(),
            clock: state.clock(),
        }
    }
}

#[derive(Serialize)]
struct TraceReport {
    result: TrialResult,
    steps: Vec<StepOutcome>,
}

impl TraceCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let mut scenario = ctx.scenario;
        if let Some(max_steps) = self.max_steps {
            scenario.max_steps = max_steps;
        }
        scenario.validate()?;

        let seed = resolve_seed(self.seed, &scenario);
        let mut cluster = scenario.cluster.clone();
        cluster.seed = Some(seed);
        let initial = ClusterState::new(&cluster).map_err(CliError::from)?;
        let driver = IterationDriver::new(scenario.target.clone()).map_err(CliError::from)?;

        let mut rows = Vec::new();
        let mut steps = Vec::new();
        let mut last_state = None;
        let result = run_trial(&initial, &driver, 0, seed, scenario.max_steps, |state, step| {
            rows.push(StepRow::new(state, step));
            steps.push(step.clone());
            if self.show_state {
                last_state = Some(state.to_string());
            }
            Ok::<_, CliError>(())
        });

        match ctx.format {
            OutputFormat::Table => {
                print_info(&format!("Seed {seed}, sampling {:?}", initial.sampling()));
                print_output(&rows, ctx.format);
                if let Some(state) = last_state {
                    println!("\n{state}");
                }
                print_info(&format!(
                    "{:?} after {} steps, {} nodes, simulated time {}",
                    result.status(),
                    result.steps,
                    result.nodes,
                    result.clock
                ));
            }
            OutputFormat::Json => print_single(&TraceReport { result, steps }),
        }
        Ok(())
    }
}
