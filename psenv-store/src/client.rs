//! The remote store contract consumed by sync workers.
//!
//! Implementors provide one paginated read ([`ParameterStore::fetch_page`]) plus
//! the two write verbs. Whole-prefix reads ([`ParameterStore::fetch`],
//! [`ParameterStore::describe`]) are built on top of it and follow continuation
//! tokens until the store reports none.

use std::collections::BTreeMap;
use std::time::Duration;

use psenv_core::{EnvironmentPath, ParamMap};

use crate::error::StoreError;

/// Parameters returned per page by stores that paginate.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Upper bound on any single remote call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Fully-qualified name → value; the unit written by [`ParameterStore::put`].
pub type QualifiedParams = BTreeMap<String, String>;

/// One page request against a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<'a> {
    pub path: &'a str,
    /// Include every descendant rather than only direct children.
    pub recursive: bool,
    pub decrypt: bool,
    pub next_token: Option<&'a str>,
}

/// One page of fully-qualified `(name, value)` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    pub parameters: Vec<(String, String)>,
    pub next_token: Option<String>,
}

/// A remote hierarchical key-value store.
///
/// Every method blocks the calling thread and is individually time-bounded by
/// the implementation. No method retries.
pub trait ParameterStore: Send + Sync {
    /// Read one page under `request.path`.
    fn fetch_page(&self, request: PageRequest<'_>) -> Result<Page, StoreError>;

    /// Write each pair individually. The first failed write aborts the rest and
    /// is returned; pairs written before it stay written.
    fn put(
        &self,
        params: &QualifiedParams,
        key_ref: Option<&str>,
        overwrite: bool,
    ) -> Result<(), StoreError>;

    /// Delete `names` (fully-qualified) in one batch.
    fn delete(&self, names: &[String]) -> Result<(), StoreError>;

    /// Every parameter directly under `path`, keyed by leaf name.
    ///
    /// Pages already read are discarded when a later page fails.
    fn fetch(&self, path: &EnvironmentPath, decrypt: bool) -> Result<ParamMap, StoreError> {
        let prefix = path.path();
        let mut params = ParamMap::new();
        for (name, value) in collect_pages(self, &prefix, false, decrypt)? {
            params.insert(path.leaf(&name)?, value);
        }
        tracing::debug!(path = %prefix, count = params.len(), "fetched parameters");
        Ok(params)
    }

    /// Fully-qualified names of every parameter below `base`, at any depth.
    fn describe(&self, base: &str) -> Result<Vec<String>, StoreError> {
        let base = base.trim_end_matches('/');
        let mut names: Vec<String> = collect_pages(self, base, true, false)?
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.sort();
        Ok(names)
    }
}

fn collect_pages<S: ParameterStore + ?Sized>(
    store: &S,
    path: &str,
    recursive: bool,
    decrypt: bool,
) -> Result<Vec<(String, String)>, StoreError> {
    let mut collected = Vec::new();
    let mut next_token: Option<String> = None;
    loop {
        let page = store.fetch_page(PageRequest {
            path,
            recursive,
            decrypt,
            next_token: next_token.as_deref(),
        })?;
        collected.extend(page.parameters);
        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }
    Ok(collected)
}

/// `true` when `name` lives under `path` (directly, unless `recursive`).
pub(crate) fn is_under(path: &str, name: &str, recursive: bool) -> bool {
    let path = path.trim_end_matches('/');
    match name
        .strip_prefix(path)
        .and_then(|rest| rest.strip_prefix('/'))
    {
        Some(rest) if !rest.is_empty() => recursive || !rest.contains('/'),
        _ => false,
    }
}

/// Slice `names` into one page starting at the offset encoded in `token`.
pub(crate) fn paginate<T: Clone>(
    items: &[T],
    token: Option<&str>,
    page_size: usize,
    path: &str,
) -> Result<(Vec<T>, Option<String>), StoreError> {
    let start = match token {
        None => 0,
        Some(token) => token
            .parse::<usize>()
            .ok()
            .filter(|offset| *offset <= items.len())
            .ok_or_else(|| StoreError::request("fetch", path, format!("invalid next token '{token}'")))?,
    };
    let end = (start + page_size.max(1)).min(items.len());
    let next = (end < items.len()).then(|| end.to_string());
    Ok((items[start..end].to_vec(), next))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_under_direct_children_only() {
        assert!(is_under("/p/proj/dev", "/p/proj/dev/KEY", false));
        assert!(!is_under("/p/proj/dev", "/p/proj/dev/a/KEY", false));
        assert!(is_under("/p/proj/dev", "/p/proj/dev/a/KEY", true));
        assert!(!is_under("/p/proj/dev", "/p/proj/development/KEY", true));
        assert!(!is_under("/p/proj/dev", "/p/proj/dev", true));
    }

    #[test]
    fn paginate_walks_offsets() {
        let items: Vec<u32> = (0..25).collect();
        let (first, next) = paginate(&items, None, 10, "/p").unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(next.as_deref(), Some("10"));
        let (last, next) = paginate(&items, Some("20"), 10, "/p").unwrap();
        assert_eq!(last, vec![20, 21, 22, 23, 24]);
        assert!(next.is_none());
    }

    #[test]
    fn paginate_rejects_garbage_token() {
        let items: Vec<u32> = (0..3).collect();
        assert!(paginate(&items, Some("nope"), 10, "/p").is_err());
        assert!(paginate(&items, Some("99"), 10, "/p").is_err());
    }
}
