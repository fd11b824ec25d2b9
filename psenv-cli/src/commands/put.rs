//! `psenv put`: apply the manifest to the remote store, then record the
//! remote state back into the manifest.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use psenv_sync::pipeline::{self, Pass};
use psenv_sync::SyncConfig;

use super::{bootstrap_template, report_failure, GlobalArgs};

#[derive(Args, Debug)]
pub struct PutArgs {
    /// Delete remote parameters missing from the manifest.
    #[arg(long, short = 'm')]
    pub merge: bool,

    /// Replace existing remote values.
    #[arg(long, short = 'o')]
    pub overwrite: bool,

    /// Write every local parameter without diffing; never deletes.
    #[arg(long, conflicts_with = "merge")]
    pub force: bool,

    /// Encryption key reference for written values.
    #[arg(long, value_name = "KEY")]
    pub key_id: Option<String>,
}

impl PutArgs {
    pub fn config(&self, global: &GlobalArgs) -> SyncConfig {
        SyncConfig {
            merge: self.merge,
            overwrite: self.overwrite,
            force: self.force,
            key_id: self.key_id.clone(),
            ..global.sync_config()
        }
    }

    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        if bootstrap_template(global.dir())? {
            return Ok(());
        }
        let store = global.open_store()?;
        let report = pipeline::run(
            global.dir(),
            store.as_ref(),
            self.config(global),
            Pass::Put,
            &global.target(),
        )
        .map_err(|e| report_failure(e, "put"))?;

        if report.environments.is_empty() {
            println!("No environments in manifest.");
        }
        for env in &report.environments {
            if env.written == 0 && env.deleted == 0 {
                println!("{} '{}' already in sync", "✓".green(), env.environment);
            } else {
                println!(
                    "{} '{}' synced ({} written, {} deleted)",
                    "✓".green(),
                    env.environment,
                    env.written,
                    env.deleted
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Harness {
        #[command(flatten)]
        global: GlobalArgs,
        #[command(flatten)]
        put: PutArgs,
    }

    #[test]
    fn flags_build_sync_config() {
        let h = Harness::parse_from([
            "psenv",
            "-m",
            "-o",
            "--key-id",
            "alias/app",
            "--workers",
            "2",
            "--settle-delay-ms",
            "0",
        ]);
        let config = h.put.config(&h.global);
        assert!(config.merge && config.overwrite && !config.force);
        assert_eq!(config.key_id.as_deref(), Some("alias/app"));
        assert_eq!(config.workers, Some(2));
        assert!(config.settle_delay.is_zero());
    }

    #[test]
    fn force_conflicts_with_merge() {
        assert!(Harness::try_parse_from(["psenv", "--force", "--merge"]).is_err());
    }
}
