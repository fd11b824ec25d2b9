//! `psenv delete -e <env>`: remove an environment remotely and locally.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use psenv_sync::pipeline;

use super::{report_failure, GlobalArgs};

#[derive(Args, Debug)]
pub struct DeleteArgs {}

impl DeleteArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let store = global.open_store()?;
        let summary =
            pipeline::delete_at(global.dir(), store.as_ref(), global.sync_config(), &global.target())
                .map_err(|e| report_failure(e, "delete"))?;

        println!(
            "{} Deleted '{}' ({} remote parameters)",
            "✓".green(),
            summary.environment,
            summary.deleted
        );
        Ok(())
    }
}
