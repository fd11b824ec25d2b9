//! Per-environment jobs run on pool workers.
//!
//! Workers only read shared state and talk to the store; they never touch the
//! manifest. Each function handles exactly one environment.

use psenv_core::{
    compute_diff, compute_upserts, normalize_keys, DiffResult, EnvironmentPath, ParamMap,
};
use psenv_store::{ParameterStore, QualifiedParams, StoreError};

use crate::config::SyncConfig;

/// Remote changes applied to one environment by a put.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedChanges {
    pub written: usize,
    pub deleted: usize,
}

/// Fetch, diff and apply one environment.
///
/// The put covers ToAdd and ToUpdate in a single call. Deletions run only with
/// `merge`, after the put succeeded. In force mode the remote state is not read
/// and every local pair is written with overwrite on.
pub(crate) fn put_environment(
    store: &dyn ParameterStore,
    path: &EnvironmentPath,
    local: &ParamMap,
    config: &SyncConfig,
) -> Result<AppliedChanges, StoreError> {
    let local = normalize_keys(local);

    if config.force {
        let params = qualify_all(path, &local);
        if !params.is_empty() {
            store.put(&params, config.key_id.as_deref(), true)?;
        }
        tracing::info!(environment = %path.environment(), written = params.len(), "forced put applied");
        return Ok(AppliedChanges {
            written: params.len(),
            deleted: 0,
        });
    }

    let diff = plan_environment(store, path, &local, config.merge, config.decrypt)?;
    if diff.is_empty() {
        tracing::debug!(environment = %path.environment(), "already in sync");
        return Ok(AppliedChanges::default());
    }

    let upserts = qualify_all(path, &diff.upserts());
    if !upserts.is_empty() {
        store.put(&upserts, config.key_id.as_deref(), config.overwrite)?;
    }

    let deletions: Vec<String> = diff.to_delete.iter().map(|key| path.qualify(key)).collect();
    if config.merge && !deletions.is_empty() {
        store.delete(&deletions)?;
    }

    let applied = AppliedChanges {
        written: upserts.len(),
        deleted: if config.merge { deletions.len() } else { 0 },
    };
    tracing::info!(
        environment = %path.environment(),
        added = diff.to_add.len(),
        updated = diff.to_update.len(),
        deleted = applied.deleted,
        "put applied"
    );
    Ok(applied)
}

/// Fetch the remote state and diff `local` against it.
///
/// `decrypt` must match the form the manifest was recorded in, so secure values
/// compare ciphertext to ciphertext or plaintext to plaintext. Without `merge`
/// the diff never carries deletions.
pub(crate) fn plan_environment(
    store: &dyn ParameterStore,
    path: &EnvironmentPath,
    local: &ParamMap,
    merge: bool,
    decrypt: bool,
) -> Result<DiffResult, StoreError> {
    let remote = store.fetch(path, decrypt)?;
    let local = normalize_keys(local);
    Ok(if merge {
        compute_diff(&local, &remote)
    } else {
        compute_upserts(&local, &remote)
    })
}

pub(crate) fn fetch_environment(
    store: &dyn ParameterStore,
    path: &EnvironmentPath,
    decrypt: bool,
) -> Result<ParamMap, StoreError> {
    let params = store.fetch(path, decrypt)?;
    tracing::debug!(environment = %path.environment(), count = params.len(), "environment fetched");
    Ok(params)
}

fn qualify_all(path: &EnvironmentPath, params: &ParamMap) -> QualifiedParams {
    params
        .iter()
        .map(|(key, value)| (path.qualify(key), value.clone()))
        .collect()
}
