//! The file store as seen through the `ParameterStore` trait object the sync
//! engine holds.

use psenv_core::{EnvironmentName, EnvironmentPath, ParamKey};
use psenv_store::{FileStore, ParameterStore, QualifiedParams, StoreError};
use tempfile::TempDir;

fn env(name: &str) -> EnvironmentPath {
    EnvironmentPath::new("/path/to/params", "foobar", EnvironmentName::from(name))
}

fn seed(store: &dyn ParameterStore, pairs: &[(&str, &str)]) {
    let params: QualifiedParams = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    store.put(&params, None, true).expect("seed");
}

#[test]
fn environments_are_isolated_by_path() {
    let tmp = TempDir::new().expect("tempdir");
    let store: Box<dyn ParameterStore> = Box::new(FileStore::new(tmp.path().join("remote.json")));
    seed(
        store.as_ref(),
        &[
            ("/path/to/params/foobar/dev/A", "dev-a"),
            ("/path/to/params/foobar/prod/A", "prod-a"),
            ("/path/to/params/foobar/prod/B", "prod-b"),
        ],
    );

    let dev = store.fetch(&env("dev"), true).expect("fetch dev");
    assert_eq!(dev.len(), 1);
    assert_eq!(dev.get(&ParamKey::from("A")), Some(&"dev-a".to_string()));
    assert_eq!(store.fetch(&env("prod"), true).expect("fetch prod").len(), 2);
    assert!(store.fetch(&env("test"), true).expect("fetch test").is_empty());
}

#[test]
fn describe_lists_every_environment_below_base() {
    let tmp = TempDir::new().expect("tempdir");
    let store = FileStore::new(tmp.path().join("remote.json")).with_page_size(1);
    seed(
        &store,
        &[
            ("/path/to/params/foobar/dev/A", "1"),
            ("/path/to/params/foobar/prod/B", "2"),
            ("/path/to/params/other/dev/C", "3"),
        ],
    );

    let names = store.describe("/path/to/params/foobar/").expect("describe");
    assert_eq!(
        names,
        vec![
            "/path/to/params/foobar/dev/A".to_string(),
            "/path/to/params/foobar/prod/B".to_string(),
        ]
    );
}

#[test]
fn nested_names_under_an_environment_are_ignored_by_fetch() {
    let tmp = TempDir::new().expect("tempdir");
    let store = FileStore::new(tmp.path().join("remote.json"));
    seed(
        &store,
        &[
            ("/path/to/params/foobar/dev/A", "1"),
            ("/path/to/params/foobar/dev/nested/B", "2"),
        ],
    );

    let dev = store.fetch(&env("dev"), false).expect("fetch");
    assert_eq!(dev.keys().cloned().collect::<Vec<_>>(), vec![ParamKey::from("A")]);
}

#[test]
fn put_into_unwritable_location_is_a_request_error() {
    let tmp = TempDir::new().expect("tempdir");
    let blocker = tmp.path().join("blocker");
    std::fs::write(&blocker, "file, not a directory").expect("write");
    let store = FileStore::new(blocker.join("remote.json"));

    let mut params = QualifiedParams::new();
    params.insert("/path/to/params/foobar/dev/A".into(), "1".into());
    let err = store.put(&params, None, false).unwrap_err();
    assert!(matches!(err, StoreError::RemoteRequest { .. }), "got: {err}");
}
