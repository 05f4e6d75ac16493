//! Scenario loading.
//!
//! A scenario is the cluster configuration, the target distribution, and the
//! trial parameters. The base is a TOML file when one is given, otherwise the
//! built-in reference scenario. `SSTA__*` environment variables override
//! either (`SSTA__MAX_STEPS=500`, `SSTA__CLUSTER__MAX_NODES=20`).

use std::path::Path;

use serde::{Deserialize, Serialize};
use ssta_cluster::{ClusterConfig, IterationDriver, SamplingMode, TimeCosts, ZoneSpec};
use ssta_reconcile::ZoneCount;

use crate::error::CliError;

/// Environment variable prefix for overrides.
const ENV_PREFIX: &str = "SSTA";

/// Everything needed to run a batch of trials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Step ceiling per trial.
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,

    /// Number of independent trials.
    #[serde(default = "default_trials")]
    pub trials: usize,

    /// Initial cluster.
    pub cluster: ClusterConfig,

    /// Desired scheduled count per (type, zone).
    pub target: Vec<ZoneCount>,
}

fn default_max_steps() -> u64 {
    100
}

fn default_trials() -> usize {
    10
}

impl Scenario {
    /// Three zones of five nodes, each running three A, one B and one C
    /// workload; the target removes B and C from AZ-3.
    pub fn reference() -> Self {
        let zones = ["AZ-1", "AZ-2", "AZ-3"];
        let mut initial_workloads = Vec::new();
        let mut target = Vec::new();
        for (workload_type, count) in [("A", 3), ("B", 1), ("C", 1)] {
            for zone in zones {
                initial_workloads.push(ZoneCount::new(workload_type, zone, count));
                let desired = if workload_type != "A" && zone == "AZ-3" {
                    0
                } else {
                    count
                };
                target.push(ZoneCount::new(workload_type, zone, desired));
            }
        }

        Self {
            max_steps: default_max_steps(),
            trials: default_trials(),
            cluster: ClusterConfig {
                zones: zones.iter().map(|zone| ZoneSpec::new(*zone, 5)).collect(),
                initial_workloads,
                max_nodes: 15,
                time_costs: TimeCosts::default(),
                sampling: SamplingMode::WithReplacement,
                seed: None,
            },
            target,
        }
    }

    /// Load the layered scenario.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let builder = match path {
            None => config::Config::builder().add_source(
                config::Config::try_from(&Self::reference()).map_err(CliError::config)?,
            ),
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::ScenarioNotFound(path.to_path_buf()));
                }
                // A file replaces the reference outright; list entries would
                // otherwise merge index by index.
                config::Config::builder()
                    .add_source(config::File::from(path).format(config::FileFormat::Toml))
            }
        };

        let scenario: Scenario = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(CliError::config)?
            .try_deserialize()
            .map_err(CliError::config)?;

        scenario.validate()?;
        Ok(scenario)
    }

    /// Reject scenarios no trial could run on.
    pub fn validate(&self) -> Result<(), CliError> {
        self.cluster.validate()?;
        IterationDriver::new(self.target.clone())?;

        if self.max_steps == 0 {
            return Err(CliError::InvalidScenario("max_steps must be at least 1".into()));
        }
        if self.trials == 0 {
            return Err(CliError::InvalidScenario("trials must be at least 1".into()));
        }
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, CliError> {
        toml::to_string_pretty(self).map_err(|e| CliError::InvalidScenario(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssta_testing::{reference_config, reference_target};
    use std::io::Write;

    #[test]
    fn test_reference_matches_fixtures() {
        let scenario = Scenario::reference();
        let mut expected = reference_config(0);
        expected.seed = None;

        assert_eq!(scenario.cluster, expected);
        assert_eq!(scenario.target, reference_target());
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_load_without_file_is_reference() {
        let scenario = Scenario::load(None).unwrap();
        assert_eq!(scenario, Scenario::reference());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
max_steps = 50

[cluster]
max_nodes = 4
seed = 8

[[cluster.zones]]
name = "east"
initial_nodes = 2

[[cluster.initial_workloads]]
type = "web"
zone = "east"
count = 3

[[target]]
type = "web"
zone = "east"
count = 3
"#
        )
        .unwrap();

        let scenario = Scenario::load(Some(file.path())).unwrap();

        assert_eq!(scenario.max_steps, 50);
        assert_eq!(scenario.trials, 10);
        assert_eq!(scenario.cluster.zones, vec![ZoneSpec::new("east", 2)]);
        assert_eq!(scenario.cluster.seed, Some(8));
        assert_eq!(scenario.cluster.time_costs, TimeCosts::default());
        assert_eq!(scenario.target, vec![ZoneCount::new("web", "east", 3)]);
    }

    #[test]
    fn test_missing_file() {
        let err = Scenario::load(Some(Path::new("/nonexistent/scenario.toml"))).unwrap_err();
        assert!(matches!(err, CliError::ScenarioNotFound(_)));
    }

    #[test]
    fn test_duplicate_target_is_invalid() {
        let mut scenario = Scenario::reference();
        scenario.target.push(ZoneCount::new("A", "AZ-1", 1));
        assert!(matches!(scenario.validate(), Err(CliError::Cluster(_))));
    }

    #[test]
    fn test_zero_trials_is_invalid() {
        let mut scenario = Scenario::reference();
        scenario.trials = 0;
        assert!(matches!(
            scenario.validate(),
            Err(CliError::InvalidScenario(_))
        ));
    }

    #[test]
    fn test_toml_rendering_reloads() {
        let rendered = Scenario::reference().to_toml().unwrap();
        let parsed: Scenario = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, Scenario::reference());
    }
}
