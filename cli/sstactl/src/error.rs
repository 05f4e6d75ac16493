//! Error handling and display for the CLI.

use std::path::PathBuf;

use colored::Colorize;
use ssta_cluster::ClusterError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Scenario file not found: {}", .0.display())]
    ScenarioNotFound(PathBuf),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Simulation error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn config(err: config::ConfigError) -> Self {
        Self::InvalidScenario(err.to_string())
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        match cli_err {
            CliError::ScenarioNotFound(_) => {
                eprintln!(
                    "\n{}",
                    "Hint: Run `sstactl scenario > scenario.toml` for a starting point.".yellow()
                );
            }
            CliError::InvalidScenario(_) => {
                eprintln!(
                    "\n{}",
                    "Hint: Check the file and any SSTA__* environment overrides.".yellow()
                );
            }
            CliError::Cluster(e) if e.is_contract_violation() => {
                eprintln!(
                    "\n{}",
                    "Hint: Zones, types and counts in the scenario must agree.".yellow()
                );
            }
            CliError::Write { .. } => {
                eprintln!(
                    "\n{}",
                    "Hint: Check that the output directory is writable.".yellow()
                );
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_error_converts() {
        let err: CliError = ClusterError::NodeLimitReached { max_nodes: 3 }.into();
        assert_eq!(err.to_string(), "Simulation error: node limit of 3 reached");
    }

    #[test]
    fn test_write_error_names_path() {
        let err = CliError::write(
            "/tmp/out/results.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(
            err.to_string(),
            "Failed to write /tmp/out/results.json: denied"
        );
    }
}
