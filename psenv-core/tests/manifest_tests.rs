//! Manifest load errors, temp-file handling on save, and template tests.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use psenv_core::{
    manifest::{self, Manifest},
    EnvironmentName, ManifestError, ParamKey,
};
use std::fs;

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_manifest_returns_not_found() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let err = manifest::load_at(dir.path()).unwrap_err();
    assert!(matches!(err, ManifestError::ManifestNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("manifest not found"));
    assert!(err.to_string().contains("psenv-secrets.yml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("psenv-secrets.yml"),
        b": : corrupt : yaml : !!!\n  - broken: [unclosed",
    )
    .expect("write");

    let err = manifest::load_at(dir.path()).unwrap_err();
    assert!(matches!(err, ManifestError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("psenv-secrets.yml"));
}

#[test]
fn load_accepts_lower_case_keys_verbatim() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("psenv-secrets.yml")
        .write_str(
            "project: foobar\nprefix: /path/to/params\nenvironments:\n  dev:\n    key1: value1\n",
        )
        .expect("write");

    let loaded = manifest::load_at(dir.path()).expect("load");
    let dev = loaded.params(&EnvironmentName::from("dev")).expect("dev");
    assert_eq!(dev.get(&ParamKey::from("key1")), Some(&"value1".to_string()));
}

#[test]
fn load_without_environments_section_is_empty() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("psenv-secrets.yml")
        .write_str("project: foobar\nprefix: /p\n")
        .expect("write");

    let loaded = manifest::load_at(dir.path()).expect("load");
    assert!(loaded.environments.is_empty());
}

// ---------------------------------------------------------------------------
// 2. Atomic write safety
// ---------------------------------------------------------------------------

#[test]
fn stale_tmp_sibling_is_ignored_and_replaced() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    manifest::save_at(dir.path(), &Manifest::template()).expect("save");
    dir.child("psenv-secrets.yml.tmp")
        .write_str("project: [unterminated")
        .expect("write stale tmp");

    assert_eq!(
        manifest::load_at(dir.path()).expect("load"),
        Manifest::template()
    );

    let mut next = Manifest::template();
    next.project = "renamed".into();
    manifest::save_at(dir.path(), &next).expect("save over stale tmp");
    dir.child("psenv-secrets.yml.tmp").assert(predicate::path::missing());
    assert_eq!(manifest::load_at(dir.path()).expect("reload").project, "renamed");
}

// ---------------------------------------------------------------------------
// 3. Template
// ---------------------------------------------------------------------------

#[test]
fn template_is_written_once() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    manifest::create_template_at(dir.path()).expect("template");

    dir.child("psenv-secrets.yml")
        .assert(predicate::str::contains("project: foobar"));
    dir.child("psenv-secrets.yml")
        .assert(predicate::str::contains("KEY1: value1"));

    let err = manifest::create_template_at(dir.path()).unwrap_err();
    assert!(matches!(err, ManifestError::ManifestExists { .. }), "got: {err}");
}
