//! Local secrets manifest.
//!
//! # Storage layout
//!
//! ```text
//! <dir>/
//!   psenv-secrets.yml      (mode 0600: holds plaintext values)
//! ```
//!
//! # API pattern
//!
//! Every filesystem function has two forms:
//! - `fn_at(dir: &Path, …)`: explicit directory; used in tests with `TempDir`
//! - `fn(…)`: uses the current working directory, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ManifestError};
use crate::types::{base_path, EnvironmentName, EnvironmentPath, ParamKey, ParamMap};

/// File name of the manifest inside its directory.
pub const MANIFEST_FILE: &str = "psenv-secrets.yml";

/// Desired / last-observed parameters for every environment of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Manifest {
    pub project: String,
    pub prefix: String,
    #[serde(default)]
    pub environments: BTreeMap<EnvironmentName, ParamMap>,
}

impl Manifest {
    /// `prefix/project`: the root of every environment path.
    pub fn base_path(&self) -> String {
        base_path(&self.prefix, &self.project)
    }

    pub fn environment_path(&self, name: &EnvironmentName) -> EnvironmentPath {
        EnvironmentPath::new(&self.prefix, &self.project, name.clone())
    }

    pub fn has_environment(&self, name: &EnvironmentName) -> bool {
        self.environments.contains_key(name)
    }

    pub fn environment_names(&self) -> Vec<EnvironmentName> {
        self.environments.keys().cloned().collect()
    }

    /// Declared parameters of `name`, or `EnvironmentNotFound`.
    pub fn params(&self, name: &EnvironmentName) -> Result<&ParamMap, ManifestError> {
        self.environments
            .get(name)
            .ok_or_else(|| ManifestError::EnvironmentNotFound {
                name: name.0.clone(),
            })
    }

    /// Replace (or insert) the parameters of one environment.
    pub fn set_environment(&mut self, name: EnvironmentName, params: ParamMap) {
        self.environments.insert(name, params);
    }

    pub fn remove_environment(&mut self, name: &EnvironmentName) -> Option<ParamMap> {
        self.environments.remove(name)
    }

    /// Template written when no manifest exists yet.
    pub fn template() -> Self {
        let mut environments = BTreeMap::new();
        for env in ["dev", "prod"] {
            let mut params = ParamMap::new();
            params.insert(ParamKey::from("KEY1"), "value1".to_string());
            params.insert(ParamKey::from("KEY2"), "value2".to_string());
            environments.insert(EnvironmentName::from(env), params);
        }
        Self {
            project: "foobar".to_string(),
            prefix: "/path/to/params".to_string(),
            environments,
        }
    }
}

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<dir>/psenv-secrets.yml`: pure, no I/O.
pub fn manifest_path_at(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE)
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load the manifest from `<dir>/psenv-secrets.yml`.
///
/// Returns `ManifestError::ManifestNotFound` if absent,
/// `ManifestError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(dir: &Path) -> Result<Manifest, ManifestError> {
    let path = manifest_path_at(dir);
    if !path.exists() {
        return Err(ManifestError::ManifestNotFound { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| ManifestError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Manifest, ManifestError> {
    load_at(&cwd()?)
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save the manifest to `<dir>/psenv-secrets.yml`.
///
/// Write flow: serialize → `.yml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(dir: &Path, manifest: &Manifest) -> Result<(), ManifestError> {
    let path = manifest_path_at(dir);
    let tmp_path = path.with_file_name(format!("{MANIFEST_FILE}.tmp"));

    let yaml = serde_yaml::to_string(manifest)?;
    std::fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    set_file_permissions(&tmp_path)?;
    if let Err(e) = std::fs::rename(&tmp_path, &path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(io_err(&path, e));
    }
    tracing::debug!(path = %path.display(), "manifest saved");
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(manifest: &Manifest) -> Result<(), ManifestError> {
    save_at(&cwd()?, manifest)
}

// ---------------------------------------------------------------------------
// 4. Template
// ---------------------------------------------------------------------------

/// Write [`Manifest::template`] to `<dir>/psenv-secrets.yml`.
///
/// Returns `ManifestError::ManifestExists` rather than overwriting.
pub fn create_template_at(dir: &Path) -> Result<Manifest, ManifestError> {
    let path = manifest_path_at(dir);
    if path.exists() {
        return Err(ManifestError::ManifestExists { path });
    }
    let manifest = Manifest::template();
    save_at(dir, &manifest)?;
    Ok(manifest)
}

/// `create_template_at` convenience wrapper.
pub fn create_template() -> Result<Manifest, ManifestError> {
    create_template_at(&cwd()?)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn cwd() -> Result<PathBuf, ManifestError> {
    std::env::current_dir().map_err(|e| io_err(".", e))
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ManifestError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ManifestError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
