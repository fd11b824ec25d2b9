pub mod delete;
pub mod diff;
pub mod exec;
pub mod get;
pub mod init;
pub mod put;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use psenv_core::{manifest, Target};
use psenv_store::{FileStore, ParameterStore};
use psenv_sync::{SyncConfig, SyncError};

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Environment to operate on, or `all`.
    #[arg(long, short = 'e', global = true, default_value = "all")]
    pub env: String,

    /// Return secure values in plaintext.
    #[arg(long, short = 'd', global = true)]
    pub decrypt: bool,

    /// Directory holding psenv-secrets.yml.
    #[arg(long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Use a local JSON file as the parameter store instead of AWS SSM.
    #[arg(long, global = true, value_name = "PATH")]
    pub store_file: Option<PathBuf>,

    /// AWS region override for SSM.
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Number of concurrent workers (default: one per environment).
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    /// Pause between writing and re-reading parameters.
    #[arg(long, global = true, hide = true, value_name = "MS")]
    pub settle_delay_ms: Option<u64>,

    /// Log applied changes to stderr.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    pub fn target(&self) -> Target {
        Target::parse(&self.env)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Base config for this invocation; commands layer their own flags on top.
    pub fn sync_config(&self) -> SyncConfig {
        let mut config = SyncConfig {
            workers: self.workers,
            decrypt: self.decrypt,
            ..SyncConfig::default()
        };
        if let Some(ms) = self.settle_delay_ms {
            config.settle_delay = Duration::from_millis(ms);
        }
        config
    }

    pub fn open_store(&self) -> Result<Box<dyn ParameterStore>> {
        match &self.store_file {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using file store");
                Ok(Box::new(FileStore::new(path)))
            }
            None => connect_ssm(self.region.clone()),
        }
    }
}

#[cfg(feature = "ssm")]
fn connect_ssm(region: Option<String>) -> Result<Box<dyn ParameterStore>> {
    use psenv_store::{SsmConfig, SsmStore};

    let store = SsmStore::connect(SsmConfig {
        region,
        ..SsmConfig::default()
    })
    .context("cannot reach AWS Systems Manager")?;
    Ok(Box::new(store))
}

#[cfg(not(feature = "ssm"))]
fn connect_ssm(_region: Option<String>) -> Result<Box<dyn ParameterStore>> {
    anyhow::bail!("built without AWS SSM support; pass --store-file <PATH>")
}

/// `get` and `put` bootstrap a template manifest instead of failing.
///
/// Returns `true` when a template was written and the command should stop.
pub fn bootstrap_template(dir: &Path) -> Result<bool> {
    let path = manifest::manifest_path_at(dir);
    if path.exists() {
        return Ok(false);
    }
    manifest::create_template_at(dir)
        .with_context(|| format!("failed to write template {}", path.display()))?;
    println!("{} Created template {}", "✓".green(), path.display());
    println!("  Fill in project, prefix and environments, then re-run.");
    Ok(true)
}

/// Print the per-environment outcome of a failed phase to stderr and wrap the
/// error for `main`.
pub fn report_failure(err: SyncError, action: &str) -> anyhow::Error {
    if let SyncError::PhaseFailed {
        failures, succeeded, ..
    } = &err
    {
        for env in succeeded {
            eprintln!("  {} {env}", "✓".green());
        }
        for failure in failures {
            eprintln!("  {} {}", "✗".red(), failure);
        }
    }
    anyhow::Error::new(err).context(format!("{action} failed"))
}

