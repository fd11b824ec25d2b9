//! `psenv exec` / `psenv terminal`: run a shell with remote parameters in its
//! environment.

use std::process::{Command, ExitStatus};

use anyhow::{bail, Context, Result};
use clap::Args;

use psenv_core::ParamMap;
use psenv_sync::pipeline;

use super::{report_failure, GlobalArgs};

/// Marker set in every child environment; its presence refuses nesting.
pub const SUBSHELL_VAR: &str = "PSENV_SUBSHELL";

const DEFAULT_SHELL: &str = "/bin/sh";

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Command line handed to `$SHELL -c`.
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

#[derive(Args, Debug)]
pub struct TerminalArgs {}

impl ExecArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let params = resolve(global)?;
        let line = self.command.join(" ");
        tracing::info!(command = %line, "running command");

        let mut cmd = shell_command(&params);
        cmd.arg("-c").arg(&line);
        exit_like(cmd.status().context("failed to start shell")?)
    }
}

impl TerminalArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let params = resolve(global)?;
        println!("Entering psenv subshell for '{}'; exit to leave.", global.env);
        exit_like(shell_command(&params).status().context("failed to start shell")?)
    }
}

fn resolve(global: &GlobalArgs) -> Result<ParamMap> {
    if std::env::var_os(SUBSHELL_VAR).is_some() {
        bail!("already inside a psenv subshell; exit it before starting another");
    }
    let store = global.open_store()?;
    pipeline::resolve_at(global.dir(), store.as_ref(), global.sync_config(), &global.target())
        .map_err(|e| report_failure(e, "resolve"))
}

fn shell_command(params: &ParamMap) -> Command {
    let shell = std::env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SHELL.to_string());
    let mut cmd = Command::new(shell);
    cmd.envs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .env(SUBSHELL_VAR, "1");
    cmd
}

fn exit_like(status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    std::process::exit(status.code().unwrap_or(1));
}
