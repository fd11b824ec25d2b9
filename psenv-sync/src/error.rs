//! Error types for psenv-sync.

use std::fmt;

use thiserror::Error;

use psenv_core::{EnvironmentName, InvalidKeyFormat, ManifestError};
use psenv_store::StoreError;

/// The phase of a pass an environment failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Put,
    Refetch,
    Pull,
    Plan,
    Resolve,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Put => write!(f, "put"),
            Phase::Refetch => write!(f, "re-fetch"),
            Phase::Pull => write!(f, "get"),
            Phase::Plan => write!(f, "plan"),
            Phase::Resolve => write!(f, "resolve"),
        }
    }
}

/// One environment's failure inside a phase.
#[derive(Debug)]
pub struct EnvFailure {
    pub environment: EnvironmentName,
    pub error: StoreError,
}

impl fmt::Display for EnvFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.environment, self.error)
    }
}

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the local manifest.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// A store error not scoped to one environment; `RemoteUnavailable`
    /// always surfaces here.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A remote name outside the project namespace.
    #[error(transparent)]
    InvalidKeyFormat(#[from] InvalidKeyFormat),

    /// Some environments failed; the pass stopped at this phase's barrier and
    /// the manifest was left untouched.
    #[error("{phase} phase failed for {} environment(s); first error: {}", .failures.len(), first_failure(.failures))]
    PhaseFailed {
        phase: Phase,
        failures: Vec<EnvFailure>,
        succeeded: Vec<EnvironmentName>,
    },

    /// `--env all` where a single environment is required.
    #[error("{operation} requires a single environment; pass --env <name>")]
    AllNotAllowed { operation: &'static str },
}

fn first_failure(failures: &[EnvFailure]) -> String {
    failures
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}
