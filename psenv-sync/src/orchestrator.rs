//! Sync passes over a loaded manifest.
//!
//! # Put pass
//!
//! ```text
//! put phase ──► error barrier ──► settle delay ──► re-fetch phase ──► merge
//! ```
//!
//! Every phase that talks to the store runs on its own [`WorkerPool`] and is
//! joined before the next one starts. The manifest is only mutated by the
//! final merge, after every environment succeeded.

use std::collections::{BTreeMap, BTreeSet};
use std::thread;

use psenv_core::{
    DiffResult, EnvironmentName, EnvironmentPath, Manifest, ManifestError, ParamMap,
    ParameterPath, Target,
};
use psenv_store::{ParameterStore, StoreError};

use crate::config::SyncConfig;
use crate::error::{EnvFailure, Phase, SyncError};
use crate::pool::WorkerPool;
use crate::worker::{self, AppliedChanges};

/// Environment layered first when resolving a process environment.
pub const BASE_ENVIRONMENT: &str = "base";

/// What a pass did to one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSummary {
    pub environment: EnvironmentName,
    pub written: usize,
    pub deleted: usize,
    /// Parameters now recorded in the manifest for this environment.
    pub parameters: usize,
}

/// Per-environment summaries of one pass, ordered by environment name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub environments: Vec<EnvSummary>,
}

/// The planned changes of one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvPlan {
    pub environment: EnvironmentName,
    pub diff: DiffResult,
}

/// Runs sync passes against one store.
pub struct Synchronizer<'a> {
    store: &'a dyn ParameterStore,
    config: SyncConfig,
}

impl<'a> Synchronizer<'a> {
    pub fn new(store: &'a dyn ParameterStore, config: SyncConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Push local intent to the store, then record the observed remote state.
    ///
    /// On any put-phase failure the manifest is left untouched.
    pub fn put(&self, manifest: &mut Manifest, target: &Target) -> Result<PassReport, SyncError> {
        let targets = declared_targets(manifest, target)?;
        tracing::info!(scope = %target, environments = targets.len(), "put pass started");

        let jobs = targets
            .iter()
            .map(|env| Ok((manifest.environment_path(env), manifest.params(env)?.clone())))
            .collect::<Result<Vec<_>, ManifestError>>()?;
        let applied = self.run_phase(Phase::Put, jobs, |path, local| {
            worker::put_environment(self.store, path, local, &self.config)
        })?;

        if !self.config.settle_delay.is_zero() {
            tracing::debug!(delay = ?self.config.settle_delay, "waiting for remote writes to settle");
            thread::sleep(self.config.settle_delay);
        }

        let refetched =
            self.fetch_all(Phase::Refetch, manifest, &targets, self.config.decrypt)?;
        Ok(merge(manifest, refetched, applied))
    }

    /// Replace the targeted manifest entries with the remote state.
    ///
    /// `Target::All` covers the manifest's environments plus every environment
    /// found under the project path. A named environment need not be declared
    /// locally yet, but one that is neither declared nor present remotely is
    /// not added.
    pub fn pull(&self, manifest: &mut Manifest, target: &Target) -> Result<PassReport, SyncError> {
        let targets = match target {
            Target::All => self.discover(manifest)?,
            Target::Environment(env) => vec![env.clone()],
        };
        tracing::info!(scope = %target, environments = targets.len(), "get pass started");

        let mut fetched = self.fetch_all(Phase::Pull, manifest, &targets, self.config.decrypt)?;
        fetched.retain(|(env, params)| {
            let keep = !params.is_empty() || manifest.has_environment(env);
            if !keep {
                tracing::warn!(environment = %env, "no remote parameters and not declared locally; skipped");
            }
            keep
        });
        Ok(merge(manifest, fetched, Vec::new()))
    }

    /// The changes a put would apply, without applying any.
    pub fn plan(&self, manifest: &Manifest, target: &Target) -> Result<Vec<EnvPlan>, SyncError> {
        let targets = declared_targets(manifest, target)?;
        let jobs = targets
            .iter()
            .map(|env| Ok((manifest.environment_path(env), manifest.params(env)?.clone())))
            .collect::<Result<Vec<_>, ManifestError>>()?;
        let (merge, decrypt) = (self.config.merge, self.config.decrypt);
        let plans = self.run_phase(Phase::Plan, jobs, |path, local| {
            worker::plan_environment(self.store, path, local, merge, decrypt)
        })?;
        Ok(plans
            .into_iter()
            .map(|(environment, diff)| EnvPlan { environment, diff })
            .collect())
    }

    /// Delete every remote parameter of one environment and drop it from the
    /// manifest.
    pub fn delete_environment(
        &self,
        manifest: &mut Manifest,
        target: &Target,
    ) -> Result<EnvSummary, SyncError> {
        let env = match target {
            Target::All => return Err(SyncError::AllNotAllowed { operation: "delete" }),
            Target::Environment(env) => env,
        };
        manifest.params(env)?;

        let path = manifest.environment_path(env);
        let remote = self.store.fetch(&path, false)?;
        let names: Vec<String> = remote.keys().map(|key| path.qualify(key)).collect();
        if names.is_empty() {
            tracing::debug!(environment = %env, "no remote parameters to delete");
        } else {
            self.store.delete(&names)?;
            tracing::info!(environment = %env, deleted = names.len(), "environment deleted remotely");
        }

        manifest.remove_environment(env);
        Ok(EnvSummary {
            environment: env.clone(),
            written: 0,
            deleted: names.len(),
            parameters: 0,
        })
    }

    /// Flatten the remote parameters of `target` into one map.
    ///
    /// When the manifest declares a `base` environment it is layered first and
    /// the target's keys override it.
    pub fn resolve(&self, manifest: &Manifest, target: &Target) -> Result<ParamMap, SyncError> {
        let env = match target {
            Target::All => return Err(SyncError::AllNotAllowed { operation: "exec" }),
            Target::Environment(env) => env,
        };
        manifest.params(env)?;

        let base = EnvironmentName::from(BASE_ENVIRONMENT);
        let mut layers = Vec::new();
        if manifest.has_environment(&base) && *env != base {
            layers.push(base);
        }
        layers.push(env.clone());

        let fetched: BTreeMap<EnvironmentName, ParamMap> = self
            .fetch_all(Phase::Resolve, manifest, &layers, true)?
            .into_iter()
            .collect();

        let mut resolved = ParamMap::new();
        for layer in &layers {
            if let Some(params) = fetched.get(layer) {
                resolved.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        Ok(resolved)
    }

    /// Manifest environments plus those found remotely under the project path.
    fn discover(&self, manifest: &Manifest) -> Result<Vec<EnvironmentName>, SyncError> {
        let base = manifest.base_path();
        let mut envs: BTreeSet<EnvironmentName> = manifest.environments.keys().cloned().collect();
        for name in self.store.describe(&base)? {
            let parsed = ParameterPath::parse(&base, &name)?;
            if envs.insert(parsed.environment.clone()) {
                tracing::info!(environment = %parsed.environment, "discovered remote environment");
            }
        }
        Ok(envs.into_iter().collect())
    }

    fn fetch_all(
        &self,
        phase: Phase,
        manifest: &Manifest,
        targets: &[EnvironmentName],
        decrypt: bool,
    ) -> Result<Vec<(EnvironmentName, ParamMap)>, SyncError> {
        let jobs = targets
            .iter()
            .map(|env| (manifest.environment_path(env), ()))
            .collect();
        self.run_phase(phase, jobs, |path, _| {
            worker::fetch_environment(self.store, path, decrypt)
        })
    }

    /// Run one job per environment on a fresh pool and apply the error barrier.
    ///
    /// `RemoteUnavailable` from any worker wins over the per-environment
    /// aggregate. Results come back ordered by environment name.
    fn run_phase<T, R, F>(
        &self,
        phase: Phase,
        jobs: Vec<(EnvironmentPath, T)>,
        job: F,
    ) -> Result<Vec<(EnvironmentName, R)>, SyncError>
    where
        T: Send,
        R: Send,
        F: Fn(&EnvironmentPath, &T) -> Result<R, StoreError> + Sync,
    {
        let pool = WorkerPool::new(self.config.workers_for(jobs.len()));
        tracing::debug!(%phase, jobs = jobs.len(), workers = pool.workers(), "phase started");
        let outcomes = pool.run(jobs, |(path, data)| job(path, data));

        let mut succeeded = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            let environment = outcome.item.0.environment().clone();
            match outcome.result {
                Ok(value) => succeeded.push((environment, value)),
                Err(error) => {
                    tracing::warn!(%phase, environment = %environment, error = %error, "environment failed");
                    failures.push(EnvFailure { environment, error });
                }
            }
        }
        succeeded.sort_by(|a, b| a.0.cmp(&b.0));
        failures.sort_by(|a, b| a.environment.cmp(&b.environment));

        if let Some(index) = failures.iter().position(|f| f.error.is_unavailable()) {
            return Err(SyncError::Store(failures.swap_remove(index).error));
        }
        if !failures.is_empty() {
            return Err(SyncError::PhaseFailed {
                phase,
                failures,
                succeeded: succeeded.into_iter().map(|(env, _)| env).collect(),
            });
        }
        Ok(succeeded)
    }
}

/// Environments a put or plan operates on; a named one must be declared.
fn declared_targets(manifest: &Manifest, target: &Target) -> Result<Vec<EnvironmentName>, SyncError> {
    match target {
        Target::All => Ok(manifest.environment_names()),
        Target::Environment(env) => {
            manifest.params(env)?;
            Ok(vec![env.clone()])
        }
    }
}

/// Replace the fetched environments in the manifest; all others stay as is.
fn merge(
    manifest: &mut Manifest,
    fetched: Vec<(EnvironmentName, ParamMap)>,
    applied: Vec<(EnvironmentName, AppliedChanges)>,
) -> PassReport {
    let applied: BTreeMap<EnvironmentName, AppliedChanges> = applied.into_iter().collect();
    let mut report = PassReport::default();
    for (environment, params) in fetched {
        let changes = applied.get(&environment).copied().unwrap_or_default();
        report.environments.push(EnvSummary {
            environment: environment.clone(),
            written: changes.written,
            deleted: changes.deleted,
            parameters: params.len(),
        });
        manifest.set_environment(environment, params);
    }
    report
}
