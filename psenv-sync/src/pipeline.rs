//! Disk-backed sync entrypoints used by the CLI.
//!
//! Each function loads the manifest from `dir`, runs one pass and, for passes
//! that change it, saves the manifest back atomically. A failed pass never
//! writes the manifest.

use std::path::Path;

use psenv_core::{manifest, ParamMap, Target};
use psenv_store::ParameterStore;

use crate::config::SyncConfig;
use crate::orchestrator::{EnvPlan, EnvSummary, PassReport, Synchronizer};
use crate::SyncError;

/// A manifest-mutating pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Apply local intent remotely, then record the remote state.
    Put,
    /// Record the remote state only.
    Get,
}

/// Run a put or get pass against the manifest in `dir`.
pub fn run(
    dir: &Path,
    store: &dyn ParameterStore,
    config: SyncConfig,
    pass: Pass,
    target: &Target,
) -> Result<PassReport, SyncError> {
    let mut manifest = manifest::load_at(dir)?;
    let sync = Synchronizer::new(store, config);
    let report = match pass {
        Pass::Put => sync.put(&mut manifest, target)?,
        Pass::Get => sync.pull(&mut manifest, target)?,
    };
    manifest::save_at(dir, &manifest)?;
    Ok(report)
}

/// Delete one environment remotely and from the manifest in `dir`.
pub fn delete_at(
    dir: &Path,
    store: &dyn ParameterStore,
    config: SyncConfig,
    target: &Target,
) -> Result<EnvSummary, SyncError> {
    let mut manifest = manifest::load_at(dir)?;
    let summary = Synchronizer::new(store, config).delete_environment(&mut manifest, target)?;
    manifest::save_at(dir, &manifest)?;
    Ok(summary)
}

/// Planned put changes for the manifest in `dir`. Read-only.
pub fn plan_at(
    dir: &Path,
    store: &dyn ParameterStore,
    config: SyncConfig,
    target: &Target,
) -> Result<Vec<EnvPlan>, SyncError> {
    let manifest = manifest::load_at(dir)?;
    Synchronizer::new(store, config).plan(&manifest, target)
}

/// Resolved remote parameters for process-environment injection. Read-only.
pub fn resolve_at(
    dir: &Path,
    store: &dyn ParameterStore,
    config: SyncConfig,
    target: &Target,
) -> Result<ParamMap, SyncError> {
    let manifest = manifest::load_at(dir)?;
    Synchronizer::new(store, config).resolve(&manifest, target)
}
