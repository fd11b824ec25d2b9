//! In-process store with failure injection. Backs the sync engine's tests.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::client::{
    is_under, paginate, Page, PageRequest, ParameterStore, QualifiedParams, DEFAULT_PAGE_SIZE,
};
use crate::error::StoreError;

/// A call observed by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    FetchPage { path: String },
    Put { names: Vec<String>, overwrite: bool },
    Delete { names: Vec<String> },
}

#[derive(Debug, Default)]
struct Faults {
    unavailable: bool,
    fetch: Vec<String>,
    put: Vec<String>,
    delete: Vec<String>,
}

/// Thread-safe map of fully-qualified name → value.
#[derive(Debug)]
pub struct MemoryStore {
    params: Mutex<BTreeMap<String, String>>,
    faults: Mutex<Faults>,
    log: Mutex<Vec<Operation>>,
    page_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            params: Mutex::new(BTreeMap::new()),
            faults: Mutex::new(Faults::default()),
            log: Mutex::new(Vec::new()),
            page_size,
        }
    }

    /// Seed a parameter without recording an operation.
    pub fn insert(&self, name: impl Into<String>, value: impl Into<String>) {
        self.params.lock().insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.params.lock().get(name).cloned()
    }

    /// Snapshot of every stored parameter.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.params.lock().clone()
    }

    /// Make every subsequent call fail with `RemoteUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.lock().unavailable = unavailable;
    }

    /// Fail page reads whose path starts with `prefix`.
    pub fn fail_fetch_under(&self, prefix: impl Into<String>) {
        self.faults.lock().fetch.push(prefix.into());
    }

    /// Fail writes of names starting with `prefix`.
    pub fn fail_put_under(&self, prefix: impl Into<String>) {
        self.faults.lock().put.push(prefix.into());
    }

    /// Fail delete batches containing a name starting with `prefix`.
    pub fn fail_delete_under(&self, prefix: impl Into<String>) {
        self.faults.lock().delete.push(prefix.into());
    }

    pub fn clear_faults(&self) {
        *self.faults.lock() = Faults::default();
    }

    /// Every call seen so far, in arrival order.
    pub fn operations(&self) -> Vec<Operation> {
        self.log.lock().clone()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.faults.lock().unavailable {
            return Err(StoreError::unavailable("memory store marked unavailable"));
        }
        Ok(())
    }

    fn faulted(rules: &[String], name: &str) -> bool {
        rules.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }
}

impl ParameterStore for MemoryStore {
    fn fetch_page(&self, request: PageRequest<'_>) -> Result<Page, StoreError> {
        self.log.lock().push(Operation::FetchPage {
            path: request.path.to_string(),
        });
        self.check_available()?;
        if Self::faulted(&self.faults.lock().fetch, request.path) {
            return Err(StoreError::request("fetch", request.path, "injected failure"));
        }

        let matching: Vec<(String, String)> = self
            .params
            .lock()
            .iter()
            .filter(|(name, _)| is_under(request.path, name, request.recursive))
            .map(|(name, value)| (name.clone(), value.clone()))
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
        _key_ref: Option<&str>,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        self.log.lock().push(Operation::Put {
            names: params.keys().cloned().collect(),
            overwrite,
        });
        self.check_available()?;

        for (name, value) in params {
            if Self::faulted(&self.faults.lock().put, name) {
                return Err(StoreError::request("put", name.as_str(), "injected failure"));
            }
            let mut stored = self.params.lock();
            if !overwrite && stored.contains_key(name) {
                return Err(StoreError::request(
                    "put",
                    name.as_str(),
                    "parameter already exists and overwrite is disabled",
                ));
            }
            stored.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    fn delete(&self, names: &[String]) -> Result<(), StoreError> {
        self.log.lock().push(Operation::Delete {
            names: names.to_vec(),
        });
        self.check_available()?;
        {
            let faults = self.faults.lock();
            if let Some(name) = names.iter().find(|n| Self::faulted(&faults.delete, n)) {
                return Err(StoreError::request("delete", name.as_str(), "injected failure"));
            }
        }
        let mut stored = self.params.lock();
        for name in names {
            stored.remove(name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use psenv_core::{EnvironmentName, EnvironmentPath, ParamKey};

    fn dev() -> EnvironmentPath {
        EnvironmentPath::new("/p", "proj", EnvironmentName::from("dev"))
    }

    #[test]
    fn fetch_follows_pages_and_strips_prefix() {
        let store = MemoryStore::with_page_size(2);
        for i in 0..5 {
            store.insert(format!("/p/proj/dev/K{i}"), format!("v{i}"));
        }
        store.insert("/p/proj/prod/K0", "other");

        let params = store.fetch(&dev(), true).unwrap();
        assert_eq!(params.len(), 5);
        assert_eq!(params.get(&ParamKey::from("K4")), Some(&"v4".to_string()));

        let pages = store
            .operations()
            .into_iter()
            .filter(|op| matches!(op, Operation::FetchPage { .. }))
            .count();
        assert_eq!(pages, 3);
    }

    #[test]
    fn failed_page_discards_partial_results() {
        let store = MemoryStore::new();
        store.insert("/p/proj/dev/A", "1");
        store.fail_fetch_under("/p/proj/dev");
        assert!(store.fetch(&dev(), true).is_err());
    }

    #[test]
    fn put_without_overwrite_rejects_existing() {
        let store = MemoryStore::new();
        store.insert("/p/proj/dev/A", "1");
        let mut params = QualifiedParams::new();
        params.insert("/p/proj/dev/A".into(), "2".into());
        let err = store.put(&params, None, false).unwrap_err();
        assert!(matches!(err, StoreError::RemoteRequest { .. }));
        assert_eq!(store.get("/p/proj/dev/A").as_deref(), Some("1"));

        store.put(&params, None, true).unwrap();
        assert_eq!(store.get("/p/proj/dev/A").as_deref(), Some("2"));
    }

    #[test]
    fn describe_is_recursive() {
        let store = MemoryStore::new();
        store.insert("/p/proj/dev/A", "1");
        store.insert("/p/proj/prod/B", "2");
        store.insert("/elsewhere/x/C", "3");
        let names = store.describe("/p/proj/").unwrap();
        assert_eq!(names, vec!["/p/proj/dev/A", "/p/proj/prod/B"]);
    }

    #[test]
    fn unavailable_fails_every_call() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(store.fetch(&dev(), false).unwrap_err().is_unavailable());
        assert!(store.delete(&["/p/proj/dev/A".into()]).unwrap_err().is_unavailable());
    }
}
