//! Error types for psenv-store.

use thiserror::Error;

use psenv_core::InvalidKeyFormat;

/// All errors a remote store call can surface.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No session could be established (credentials, network, backing file).
    /// Fatal for a whole pass: no environment can proceed.
    #[error("remote store unavailable: {reason}")]
    RemoteUnavailable { reason: String },

    /// One fetch/put/delete call failed; scoped to the environment that issued it.
    #[error("{operation} failed for {target}: {reason}")]
    RemoteRequest {
        operation: &'static str,
        target: String,
        reason: String,
    },

    /// A remote name that does not belong to the requested path.
    #[error(transparent)]
    InvalidKeyFormat(#[from] InvalidKeyFormat),
}

impl StoreError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        StoreError::RemoteUnavailable {
            reason: reason.into(),
        }
    }

    pub fn request(
        operation: &'static str,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        StoreError::RemoteRequest {
            operation,
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::RemoteUnavailable { .. })
    }
}
