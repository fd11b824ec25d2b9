//! Diff engine: reconcile desired (local) parameters with observed (remote) ones.
//!
//! Pure and synchronous. Local keys must already be normalized
//! (see [`crate::types::normalize_keys`]); the engine compares keys verbatim.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::types::{ParamKey, ParamMap};

/// Changes needed to make one environment's remote state match local intent.
///
/// The three sets are pairwise disjoint over key identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DiffResult {
    /// Present locally, absent remotely.
    pub to_add: ParamMap,
    /// Present on both sides with a different value; holds the local value.
    pub to_update: ParamMap,
    /// Present remotely, absent locally.
    pub to_delete: BTreeSet<ParamKey>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// ToAdd ∪ ToUpdate, the pairs written by one `put` call.
    pub fn upserts(&self) -> ParamMap {
        self.to_add
            .iter()
            .chain(self.to_update.iter())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Full diff: additions, updates and deletions.
pub fn compute_diff(local: &ParamMap, remote: &ParamMap) -> DiffResult {
    let mut diff = compute_upserts(local, remote);
    diff.to_delete = remote
        .keys()
        .filter(|k| !local.contains_key(*k))
        .cloned()
        .collect();
    diff
}

/// Additions and updates only; `to_delete` is left empty.
pub fn compute_upserts(local: &ParamMap, remote: &ParamMap) -> DiffResult {
    let mut diff = DiffResult::default();
    for (key, value) in local {
        match remote.get(key) {
            None => {
                diff.to_add.insert(key.clone(), value.clone());
            }
            Some(current) if current != value => {
                diff.to_update.insert(key.clone(), value.clone());
            }
            Some(_) => {}
        }
    }
    diff
}
