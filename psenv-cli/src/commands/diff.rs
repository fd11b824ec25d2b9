//! `psenv diff`: show what `put` would change, without writing anything.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use psenv_sync::pipeline;
use psenv_sync::{EnvPlan, SyncConfig};

use super::{report_failure, GlobalArgs};

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Include remote parameters a merging put would delete.
    #[arg(long, short = 'm')]
    pub merge: bool,

    /// Machine-readable output (keys only).
    #[arg(long)]
    pub json: bool,
}

impl DiffArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let store = global.open_store()?;
        let config = SyncConfig {
            merge: self.merge,
            ..global.sync_config()
        };
        let plans = pipeline::plan_at(global.dir(), store.as_ref(), config, &global.target())
            .map_err(|e| report_failure(e, "diff"))?;

        if self.json {
            return print_json(&plans);
        }

        for plan in &plans {
            let diff = &plan.diff;
            if diff.is_empty() {
                println!("No differences for '{}'.", plan.environment);
                continue;
            }
            println!("{}", plan.environment.as_str().bold());
            for key in diff.to_add.keys() {
                println!("  {} {key}", "+".green());
            }
            for key in diff.to_update.keys() {
                println!("  {} {key}", "~".yellow());
            }
            for key in &diff.to_delete {
                println!("  {} {key}", "-".red());
            }
        }
        Ok(())
    }
}

fn print_json(plans: &[EnvPlan]) -> Result<()> {
    let payload: serde_json::Map<String, serde_json::Value> = plans
        .iter()
        .map(|plan| {
            let diff = &plan.diff;
            (
                plan.environment.to_string(),
                serde_json::json!({
                    "add": diff.to_add.keys().collect::<Vec<_>>(),
                    "update": diff.to_update.keys().collect::<Vec<_>>(),
                    "delete": diff.to_delete.iter().collect::<Vec<_>>(),
                }),
            )
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize diff JSON")?
    );
    Ok(())
}
