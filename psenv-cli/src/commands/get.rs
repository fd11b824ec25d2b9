//! `psenv get`: record the remote parameters in the manifest.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use psenv_sync::pipeline::{self, Pass};

use super::{bootstrap_template, report_failure, GlobalArgs};

#[derive(Args, Debug)]
pub struct GetArgs {}

impl GetArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        if bootstrap_template(global.dir())? {
            return Ok(());
        }
        let store = global.open_store()?;
        let report = pipeline::run(
            global.dir(),
            store.as_ref(),
            global.sync_config(),
            Pass::Get,
            &global.target(),
        )
        .map_err(|e| report_failure(e, "get"))?;

        if report.environments.is_empty() {
            println!("No environments found.");
        }
        for env in &report.environments {
            println!(
                "{} '{}' fetched ({} parameters)",
                "✓".green(),
                env.environment,
                env.parameters
            );
        }
        Ok(())
    }
}
