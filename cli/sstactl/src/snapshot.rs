//! Per-step cluster snapshots and batch results on disk.
//!
//! Layout under the output directory:
//!
//! ```text
//! <out>/results.json
//! <out>/simulation-<trial>/iteration-<step>.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use ssta_cluster::{ClusterState, Node, StepOutcome, Workload};

use crate::error::CliError;
use crate::report::RunReport;

#[derive(Serialize)]
struct StepSnapshot<'a> {
    iteration: u64,
    clock: u64,
    step: &'a StepOutcome,
    nodes: &'a [Node],
    workloads: &'a [Workload],
}

/// Writes one JSON file per step of a single trial.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn create(root: &Path, trial: usize) -> Result<Self, CliError> {
        let dir = root.join(format!("simulation-{trial}"));
        fs::create_dir_all(&dir).map_err(|e| CliError::write(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, state: &ClusterState, step: &StepOutcome) -> Result<(), CliError> {
        let snapshot = StepSnapshot {
            iteration: step.iteration,
            clock: state.clock(),
            step,
            nodes: state.nodes(),
            workloads: state.workloads(),
        };
        let path = self.dir.join(format!("iteration-{}.json", step.iteration));
        write_json(&path, &snapshot)
    }
}

/// Write the batch report; returns its path.
pub fn write_results(root: &Path, report: &RunReport) -> Result<PathBuf, CliError> {
    fs::create_dir_all(root).map_err(|e| CliError::write(root, e))?;
    let path = root.join("results.json");
    write_json(&path, report)?;
    Ok(path)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    let contents = serde_json::to_vec_pretty(value)
        .map_err(|e| CliError::write(path, std::io::Error::other(e)))?;
    fs::write(path, contents).map_err(|e| CliError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssta_cluster::IterationDriver;
    use ssta_testing::{reference_config, reference_target};

    #[test]
    fn test_writes_one_file_per_step() {
        let out = tempfile::tempdir().unwrap();
        let mut state = ClusterState::new(&reference_config(4)).unwrap();
        let driver = IterationDriver::new(reference_target()).unwrap();
        let writer = SnapshotWriter::create(out.path(), 2).unwrap();

        for iteration in 0..2 {
            let step = driver.step(&mut state, iteration).unwrap();
            writer.write(&state, &step).unwrap();
        }

        let first = writer.dir().join("iteration-0.json");
        assert!(writer.dir().ends_with("simulation-2"));
        assert!(first.exists());
        assert!(writer.dir().join("iteration-1.json").exists());

        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(first).unwrap()).unwrap();
        assert_eq!(json["iteration"], 0);
        assert_eq!(json["workloads"].as_array().unwrap().len(), 13);
        assert_eq!(json["step"]["diff"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_write_results() {
        let out = tempfile::tempdir().unwrap();
        let report = RunReport::new(1, 100, Vec::new());

        let path = write_results(&out.path().join("nested"), &report).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        assert_eq!(json["base_seed"], 1);
        assert_eq!(json["summary"]["trials"], 0);
    }
}
