//! JSON-file store: a local stand-in for the remote parameter store.
//!
//! Persists a [`StoreFile`] document at a caller-chosen path. Behaves like the
//! remote service where the sync engine can observe it: versions bump on every
//! write, writes without `overwrite` refuse existing names, reads paginate.
//! Writes use the atomic `.tmp` + rename pattern.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::client::{
    is_under, paginate, Page, PageRequest, ParameterStore, QualifiedParams, DEFAULT_PAGE_SIZE,
};
use crate::error::StoreError;

/// One stored parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredParameter {
    pub value: String,
    pub version: u64,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

/// On-disk payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StoreFile {
    #[serde(default)]
    pub parameters: BTreeMap<String, StoredParameter>,
}

/// File-backed [`ParameterStore`].
///
/// A mutex serializes read-modify-write cycles across worker threads of one
/// process; concurrent processes are not coordinated.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    page_size: usize,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            page_size: DEFAULT_PAGE_SIZE,
            lock: Mutex::new(()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document; a missing file is an empty store.
    pub fn load(&self) -> Result<StoreFile, StoreError> {
        if !self.path.exists() {
            return Ok(StoreFile::default());
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            StoreError::unavailable(format!("cannot read {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            StoreError::unavailable(format!("cannot parse {}: {e}", self.path.display()))
        })
    }

    fn save(&self, file: &StoreFile, operation: &'static str) -> Result<(), StoreError> {
        let failed = |e: &dyn std::fmt::Display| {
            StoreError::request(operation, self.path.display().to_string(), e.to_string())
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| failed(&e))?;
        }
        let json = serde_json::to_string_pretty(file).map_err(|e| failed(&e))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| failed(&e))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(failed(&e));
        }
        Ok(())
    }
}

impl ParameterStore for FileStore {
    fn fetch_page(&self, request: PageRequest<'_>) -> Result<Page, StoreError> {
        let _guard = self.lock.lock();
        let file = self.load()?;
        let matching: Vec<(String, String)> = file
            .parameters
            .iter()
            .filter(|(name, _)| is_under(request.path, name, request.recursive))
            .map(|(name, stored)| (name.clone(), stored.value.clone()))
            .collect();
        let (parameters, next_token) =
            paginate(&matching, request.next_token, self.page_size, request.path)?;
        Ok(Page {
            parameters,
            next_token,
        })
    }

    fn put(
        &self,
        params: &QualifiedParams,
        key_ref: Option<&str>,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut file = self.load()?;
        let mut outcome = Ok(());

        for (name, value) in params {
            let version = match file.parameters.get(name) {
                Some(_) if !overwrite => {
                    outcome = Err(StoreError::request(
                        "put",
                        name.as_str(),
                        "parameter already exists and overwrite is disabled",
                    ));
                    break;
                }
                Some(existing) => existing.version + 1,
                None => 1,
            };
            file.parameters.insert(
                name.clone(),
                StoredParameter {
                    value: value.clone(),
                    version,
                    last_modified: Utc::now(),
                    key_id: key_ref.map(str::to_owned),
                },
            );
            tracing::info!(parameter = %name, version, "parameter written");
        }

        // Pairs written before a failure stay written, as with the remote service.
        self.save(&file, "put")?;
        outcome
    }

    fn delete(&self, names: &[String]) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut file = self.load()?;
        for name in names {
            if file.parameters.remove(name).is_some() {
                tracing::info!(parameter = %name, "parameter deleted");
            } else {
                tracing::debug!(parameter = %name, "delete skipped: not found");
            }
        }
        self.save(&file, "delete")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use psenv_core::{EnvironmentName, EnvironmentPath, ParamKey};
    use tempfile::TempDir;

    fn params(pairs: &[(&str, &str)]) -> QualifiedParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn missing_file_is_empty_store() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("store.json"));
        let path = EnvironmentPath::new("/p", "proj", EnvironmentName::from("dev"));
        assert!(store.fetch(&path, false).unwrap().is_empty());
    }

    #[test]
    fn put_bumps_versions_and_records_key_ref() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("store.json"));
        store
            .put(&params(&[("/p/proj/dev/A", "1")]), Some("alias/app"), false)
            .unwrap();
        store
            .put(&params(&[("/p/proj/dev/A", "2")]), None, true)
            .unwrap();

        let file = store.load().unwrap();
        let stored = &file.parameters["/p/proj/dev/A"];
        assert_eq!(stored.value, "2");
        assert_eq!(stored.version, 2);
        assert!(stored.key_id.is_none());
    }

    #[test]
    fn failed_put_keeps_earlier_writes_and_skips_later_ones() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("store.json"));
        store.put(&params(&[("/p/proj/dev/B", "old")]), None, false).unwrap();

        let err = store
            .put(
                &params(&[("/p/proj/dev/A", "1"), ("/p/proj/dev/B", "new"), ("/p/proj/dev/C", "3")]),
                None,
                false,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::RemoteRequest { .. }));

        let file = store.load().unwrap();
        assert!(file.parameters.contains_key("/p/proj/dev/A"));
        assert_eq!(file.parameters["/p/proj/dev/B"].value, "old");
        assert!(!file.parameters.contains_key("/p/proj/dev/C"));
    }

    #[test]
    fn fetch_paginates_and_delete_removes() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("store.json")).with_page_size(3);
        let many: QualifiedParams = (0..7)
            .map(|i| (format!("/p/proj/dev/K{i}"), format!("v{i}")))
            .collect();
        store.put(&many, None, false).unwrap();

        let path = EnvironmentPath::new("/p", "proj", EnvironmentName::from("dev"));
        assert_eq!(store.fetch(&path, true).unwrap().len(), 7);

        store
            .delete(&["/p/proj/dev/K0".to_string(), "/p/proj/dev/missing".to_string()])
            .unwrap();
        let after = store.fetch(&path, true).unwrap();
        assert_eq!(after.len(), 6);
        assert!(!after.contains_key(&ParamKey::from("K0")));
    }

    #[test]
    fn corrupt_file_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = FileStore::new(path).describe("/p").unwrap_err();
        assert!(err.is_unavailable(), "got: {err}");
    }
}
