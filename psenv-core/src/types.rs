//! Domain types for psenv manifests and remote parameter paths.
//!
//! Remote names are always `prefix/project/environment/KEY`. Keys are compared
//! upper-case; callers normalize local keys with [`ParamKey::normalized`] before
//! handing them to the diff engine.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvalidKeyFormat;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed environment name (`dev`, `prod`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentName(pub String);

impl EnvironmentName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for EnvironmentName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EnvironmentName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A leaf parameter key inside one environment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamKey(pub String);

impl ParamKey {
    /// Upper-cased key, the form the remote store always reports.
    pub fn normalized(key: &str) -> Self {
        Self(key.to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ParamKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ParamKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Key → value mapping for one environment. Ordered so output is deterministic.
pub type ParamMap = BTreeMap<ParamKey, String>;

/// Upper-case every key of `params`.
///
/// When two local keys differ only by case the lexically last one wins, which
/// matches what a put of both would leave behind remotely.
pub fn normalize_keys(params: &ParamMap) -> ParamMap {
    params
        .iter()
        .map(|(k, v)| (ParamKey::normalized(k.as_str()), v.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Remote paths
// ---------------------------------------------------------------------------

/// The remote path prefix owning one environment: `prefix/project/environment`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentPath {
    base: String,
    environment: EnvironmentName,
}

impl EnvironmentPath {
    pub fn new(prefix: &str, project: &str, environment: EnvironmentName) -> Self {
        Self {
            base: base_path(prefix, project),
            environment,
        }
    }

    pub fn environment(&self) -> &EnvironmentName {
        &self.environment
    }

    /// `prefix/project/environment`, without a trailing slash.
    pub fn path(&self) -> String {
        format!("{}/{}", self.base, self.environment)
    }

    /// Fully-qualified remote name for `key`.
    pub fn qualify(&self, key: &ParamKey) -> String {
        format!("{}/{}/{}", self.base, self.environment, key)
    }

    /// Strip this environment's path from a fully-qualified name.
    ///
    /// Fails when `name` is not a direct child of the environment path.
    pub fn leaf(&self, name: &str) -> Result<ParamKey, InvalidKeyFormat> {
        let path = self.path();
        name.strip_prefix(path.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|leaf| !leaf.is_empty() && !leaf.contains('/'))
            .map(ParamKey::from)
            .ok_or_else(|| InvalidKeyFormat::new(name))
    }
}

impl fmt::Display for EnvironmentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// `prefix/project` with redundant slashes trimmed; the root every
/// environment of a project lives under.
pub fn base_path(prefix: &str, project: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let project = project.trim_matches('/');
    format!("{prefix}/{project}")
}

/// A fully-qualified remote name decomposed into its environment and key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterPath {
    pub environment: EnvironmentName,
    pub key: ParamKey,
}

impl ParameterPath {
    /// Decompose `name` relative to `base` (see [`base_path`]).
    ///
    /// The remainder after `base/` must be exactly `environment/KEY`.
    pub fn parse(base: &str, name: &str) -> Result<Self, InvalidKeyFormat> {
        let rest = name
            .strip_prefix(base)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| InvalidKeyFormat::new(name))?;
        match rest.split('/').collect::<Vec<_>>().as_slice() {
            [env, key] if !env.is_empty() && !key.is_empty() => Ok(Self {
                environment: EnvironmentName::from(*env),
                key: ParamKey::from(*key),
            }),
            _ => Err(InvalidKeyFormat::new(name)),
        }
    }
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Reserved `--env` value selecting every environment.
pub const ALL_ENVIRONMENTS: &str = "all";

/// Which environments a pass operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Every environment known to the manifest (and, for pulls, the remote).
    All,
    /// A single named environment.
    Environment(EnvironmentName),
}

impl Target {
    pub fn parse(value: &str) -> Self {
        if value == ALL_ENVIRONMENTS {
            Target::All
        } else {
            Target::Environment(EnvironmentName::from(value))
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::All => f.write_str(ALL_ENVIRONMENTS),
            Target::Environment(name) => name.fmt(f),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
