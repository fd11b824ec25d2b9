//! `psenv init`: write a template psenv-secrets.yml.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use psenv_core::manifest;

use super::GlobalArgs;

#[derive(Args, Debug)]
pub struct InitArgs {}

impl InitArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let path = manifest::manifest_path_at(global.dir());
        manifest::create_template_at(global.dir())
            .with_context(|| format!("failed to create {}", path.display()))?;

        println!("{} Created {}", "✓".green(), path.display());
        println!("  Edit project, prefix and environments, then run `psenv put`.");
        Ok(())
    }
}
