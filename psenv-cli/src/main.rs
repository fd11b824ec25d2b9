//! psenv: sync parameter-store secrets with a local manifest.
//!
//! # Usage
//!
//! ```text
//! psenv init
//! psenv get    [-e <env>|all] [-d]
//! psenv put    [-e <env>|all] [-m] [-o] [--force] [--key-id <KEY>]
//! psenv diff   [-e <env>|all] [-m] [--json]
//! psenv delete  -e <env>
//! psenv exec    -e <env> -- <command...>
//! psenv terminal -e <env>
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    delete::DeleteArgs,
    diff::DiffArgs,
    exec::{ExecArgs, TerminalArgs},
    get::GetArgs,
    init::InitArgs,
    put::PutArgs,
    GlobalArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "psenv",
    version,
    about = "Sync AWS SSM parameters with psenv-secrets.yml",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a template psenv-secrets.yml in the manifest directory.
    Init(InitArgs),

    /// Fetch remote parameters into the manifest.
    Get(GetArgs),

    /// Apply the manifest remotely, then refresh it from the remote state.
    Put(PutArgs),

    /// Show what `put` would change.
    Diff(DiffArgs),

    /// Delete an environment remotely and from the manifest.
    Delete(DeleteArgs),

    /// Run a command with an environment's parameters set.
    Exec(ExecArgs),

    /// Open an interactive shell with an environment's parameters set.
    Terminal(TerminalArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let global = &cli.global;
    match cli.command {
        Commands::Init(args) => args.run(global),
        Commands::Get(args) => args.run(global),
        Commands::Put(args) => args.run(global),
        Commands::Diff(args) => args.run(global),
        Commands::Delete(args) => args.run(global),
        Commands::Exec(args) => args.run(global),
        Commands::Terminal(args) => args.run(global),
    }
}

/// Logs go to stderr so stdout stays reserved for command output.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
