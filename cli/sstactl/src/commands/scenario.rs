//! Print the effective scenario.

use anyhow::Result;
use clap::Args;

use crate::output::{print_single, OutputFormat};

use super::CommandContext;

#[derive(Debug, Args)]
pub struct ScenarioCommand {}

impl ScenarioCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        match ctx.format {
            OutputFormat::Table => print!("{}", ctx.scenario.to_toml()?),
            OutputFormat::Json => print_single(&ctx.scenario),
        }
        Ok(())
    }
}
