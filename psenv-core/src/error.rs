//! Error types for psenv-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from manifest operations.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Underlying I/O failure (permission denied, disk full, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The manifest file did not exist at the expected path.
    #[error("manifest not found at {path}")]
    ManifestNotFound { path: PathBuf },

    /// `init` refuses to clobber an existing manifest.
    #[error("manifest already exists at {path}")]
    ManifestExists { path: PathBuf },

    /// The named environment is not declared in the manifest.
    #[error("environment '{name}' does not exist in the manifest")]
    EnvironmentNotFound { name: String },
}

/// A fully-qualified remote name that does not decompose into
/// `prefix/project/environment/KEY`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid parameter key format: {key}")]
pub struct InvalidKeyFormat {
    pub key: String,
}

impl InvalidKeyFormat {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Convenience constructor for [`ManifestError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}
