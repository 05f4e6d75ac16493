//! Batch of independent trials.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use ssta_cluster::{
    run_trial, trial_seed, ClusterState, IterationDriver, TrialOutcome, TrialResult,
};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::error::CliError;
use crate::output::{
    print_info, print_output, print_single, print_success, print_warning, OutputFormat,
};
use crate::report::RunReport;
use crate::snapshot::{write_results, SnapshotWriter};

use super::{resolve_seed, CommandContext};

#[derive(Debug, Args)]
pub struct RunCommand {
    /// Number of trials (overrides the scenario).
    #[arg(long)]
    trials: Option<usize>,

    /// Step ceiling per trial (overrides the scenario).
    #[arg(long)]
    max_steps: Option<u64>,

    /// Base seed; trial `i` runs with `seed + i`.
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for results.json and per-step snapshots.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Skip per-step snapshots; results.json is still written.
    #[arg(long, requires = "out")]
    no_snapshots: bool,
}

impl RunCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let mut scenario = ctx.scenario;
        if let Some(trials) = self.trials {
            scenario.trials = trials;
        }
        if let Some(max_steps) = self.max_steps {
            scenario.max_steps = max_steps;
        }
        scenario.validate()?;

        let base_seed = resolve_seed(self.seed, &scenario);
        let mut cluster = scenario.cluster.clone();
        cluster.seed = Some(base_seed);

        let initial = Arc::new(ClusterState::new(&cluster).map_err(CliError::from)?);
        let driver = Arc::new(IterationDriver::new(scenario.target.clone()).map_err(CliError::from)?);
        let snapshot_root = if self.no_snapshots {
            None
        } else {
            self.out.clone()
        };
        let max_steps = scenario.max_steps;

        info!(
            trials = scenario.trials,
            max_steps, base_seed, "Starting trials"
        );

        let mut set = JoinSet::new();
        for trial in 0..scenario.trials {
            let initial = Arc::clone(&initial);
            let driver = Arc::clone(&driver);
            let root = snapshot_root.clone();
            set.spawn_blocking(move || {
                run_one(
                    &initial,
                    &driver,
                    trial,
                    trial_seed(base_seed, trial),
                    max_steps,
                    root.as_deref(),
                )
            });
        }

        let mut results = Vec::with_capacity(scenario.trials);
        while let Some(joined) = set.join_next().await {
            results.push(joined.context("trial task did not complete")?);
        }
        results.sort_by_key(|r| r.trial);

        let report = RunReport::new(base_seed, max_steps, results);

        if let Some(out) = &self.out {
            let path = write_results(out, &report)?;
            if ctx.format == OutputFormat::Table {
                print_info(&format!("Results written to {}", path.display()));
            }
        }

        match ctx.format {
            OutputFormat::Table => {
                print_output(&report.rows(), ctx.format);
                println!();
                print_output(std::slice::from_ref(&report.summary), ctx.format);

                let summary = &report.summary;
                if summary.all_converged() {
                    print_success(&format!("All {} trials converged", summary.trials));
                } else {
                    print_warning(&format!(
                        "{} of {} trials converged",
                        summary.converged, summary.trials
                    ));
                }
            }
            OutputFormat::Json => print_single(&report),
        }
        Ok(())
    }
}

/// One trial, with snapshots when `root` is set.
fn run_one(
    initial: &ClusterState,
    driver: &IterationDriver,
    trial: usize,
    seed: u64,
    max_steps: u64,
    root: Option<&Path>,
) -> TrialResult {
    let Some(root) = root else {
        return run_trial(initial, driver, trial, seed, max_steps, |_, _| {
            Ok::<_, CliError>(())
        });
    };

    match SnapshotWriter::create(root, trial) {
        Ok(writer) => {
            debug!(trial, dir = %writer.dir().display(), "Writing step snapshots");
            run_trial(initial, driver, trial, seed, max_steps, |state, step| {
                writer.write(state, step)
            })
        }
        Err(e) => TrialResult {
            trial,
            seed,
            outcome: TrialOutcome::Failed {
                error: e.to_string(),
            },
            steps: 0,
            nodes: initial.count_nodes(),
            workloads: initial.count_workloads(),
            clock: initial.clock(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssta_testing::{reference_config, reference_target};

    #[test]
    fn test_run_one_writes_snapshots() {
        let out = tempfile::tempdir().unwrap();
        let initial = ClusterState::new(&reference_config(2)).unwrap();
        let driver = IterationDriver::new(reference_target()).unwrap();

        let result = run_one(&initial, &driver, 1, 2, 10_000, Some(out.path()));

        assert!(result.converged());
        let dir = out.path().join("simulation-1");
        let written = std::fs::read_dir(&dir).unwrap().count() as u64;
        assert_eq!(written, result.steps + 1);
    }

    #[test]
    fn test_run_one_without_snapshots_matches() {
        let initial = ClusterState::new(&reference_config(2)).unwrap();
        let driver = IterationDriver::new(reference_target()).unwrap();
        let out = tempfile::tempdir().unwrap();

        let plain = run_one(&initial, &driver, 0, 5, 10_000, None);
        let with_snapshots = run_one(&initial, &driver, 0, 5, 10_000, Some(out.path()));

        assert_eq!(plain, with_snapshots);
    }
}
