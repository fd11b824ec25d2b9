//! # psenv-sync
//!
//! Concurrent reconciliation of a local manifest with a remote parameter store.
//!
//! ## Passes
//!
//! - **put**: diff and apply every targeted environment in parallel, wait for
//!   the remote writes to settle, re-fetch, then merge into the manifest.
//! - **get**: fetch the targeted environments and merge them.
//! - **plan**: diff only; nothing is written.
//! - **delete**: remove one environment remotely and locally.
//! - **resolve**: flatten remote parameters for a child process.
//!
//! All store I/O runs on a bounded [`pool::WorkerPool`], one pool per phase.
//! Phases are separated by a barrier: any failed environment stops the pass
//! before the manifest is touched.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod pool;
mod worker;

pub use config::{SyncConfig, SETTLE_DELAY};
pub use error::{EnvFailure, Phase, SyncError};
pub use orchestrator::{EnvPlan, EnvSummary, PassReport, Synchronizer, BASE_ENVIRONMENT};
pub use pipeline::Pass;
pub use pool::{Outcome, WorkerPool};
pub use worker::AppliedChanges;
