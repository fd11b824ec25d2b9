//! psenv core library: domain types, manifest persistence, diff engine, errors.
//!
//! - [`types`]: newtypes, remote paths, targets
//! - [`error`]: [`ManifestError`], [`InvalidKeyFormat`]
//! - [`manifest`]: load / save / template
//! - [`diff`]: pure local-vs-remote reconciliation

pub mod diff;
pub mod error;
pub mod manifest;
pub mod types;

pub use diff::{compute_diff, compute_upserts, DiffResult};
pub use error::{InvalidKeyFormat, ManifestError};
pub use manifest::Manifest;
pub use types::{
    normalize_keys, EnvironmentName, EnvironmentPath, ParamKey, ParamMap, ParameterPath, Target,
};
