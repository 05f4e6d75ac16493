//! CLI commands.

mod run;
mod scenario;
mod trace;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use crate::scenario::Scenario;

/// sstactl - Measure how a scheduler and an autoscaler converge.
#[derive(Debug, Parser)]
#[command(name = "sstactl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Scenario file (TOML). The built-in reference scenario is used when omitted.
    #[arg(long, global = true, env = "SSTA_SCENARIO")]
    scenario: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. info, ssta_cluster=debug).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a batch of independent trials.
    Run(run::RunCommand),

    /// Step one trial and print every step.
    Trace(trace::TraceCommand),

    /// Print the effective scenario.
    Scenario(scenario::ScenarioCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn log_json(&self) -> bool {
        self.log_json
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        if let Commands::Version = self.command {
            println!("sstactl {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }

        let ctx = CommandContext {
            scenario: Scenario::load(self.scenario.as_deref())?,
            format: OutputFormat::parse(&self.format),
        };

        match self.command {
            Commands::Run(cmd) => cmd.run(ctx).await,
            Commands::Trace(cmd) => cmd.run(ctx),
            Commands::Scenario(cmd) => cmd.run(ctx),
            Commands::Version => Ok(()),
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub scenario: Scenario,
    pub format: OutputFormat,
}

/// Base seed for a batch: the flag, else the scenario, else a fresh one.
fn resolve_seed(flag: Option<u64>, scenario: &Scenario) -> u64 {
    flag.or(scenario.cluster.seed).unwrap_or_else(rand::random::<u64>)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "sstactl", "--format", "json", "run", "--trials", "3", "--seed", "9",
        ])
        .unwrap();
        assert_eq!(OutputFormat::parse(&cli.format), OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn test_resolve_seed_precedence() {
        let mut scenario = Scenario::reference();
        scenario.cluster.seed = Some(4);
        assert_eq!(resolve_seed(Some(1), &scenario), 1);
        assert_eq!(resolve_seed(None, &scenario), 4);
    }
}
