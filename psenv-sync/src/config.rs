//! Per-invocation sync settings.

use std::time::Duration;

/// Pause between the put phase and the re-fetch phase so remote writes become
/// visible to reads.
pub const SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Options for one sync invocation, built by the caller and handed to
/// [`crate::Synchronizer::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Worker override; clamped to the number of environments in a phase.
    pub workers: Option<usize>,
    pub settle_delay: Duration,
    /// Allow `put` to replace existing remote values.
    pub overwrite: bool,
    /// Delete remote keys missing from the manifest.
    pub merge: bool,
    /// Skip the diff engine and write every local pair.
    pub force: bool,
    /// Return secure values in plaintext on pull.
    pub decrypt: bool,
    /// Encryption key reference handed to `put`.
    pub key_id: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            workers: None,
            settle_delay: SETTLE_DELAY,
            overwrite: false,
            merge: false,
            force: false,
            decrypt: false,
            key_id: None,
        }
    }
}

impl SyncConfig {
    /// Worker count for a phase over `jobs` environments: one per environment
    /// unless overridden, never more than `jobs`, at least one.
    pub fn workers_for(&self, jobs: usize) -> usize {
        self.workers.unwrap_or(jobs).min(jobs).max(1)
    }
}
