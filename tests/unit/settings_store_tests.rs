//! Unit tests for the settings stores.

use std::fs;

use sphere_debug::persistence::{MemorySettingsStore, SettingsStore, TomlSettingsStore};
use sphere_debug::AppError;

#[test]
fn missing_file_opens_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sphereStudio.usr.toml");
    let store = TomlSettingsStore::open(&path).expect("open");

    assert_eq!(store.path(), path);
    assert_eq!(store.get_string("anything"), None);
}

#[test]
fn values_survive_save_and_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("user.toml");

    let mut store = TomlSettingsStore::open(&path).expect("open");
    store.set_value("breakpointsSet:0A1B2C3D", "3,7".into());
    store.set_value("lastTab", "main.js".into());
    store.save().expect("save");

    let reopened = TomlSettingsStore::open(&path).expect("reopen");
    assert_eq!(
        reopened.get_string("breakpointsSet:0A1B2C3D").as_deref(),
        Some("3,7")
    );
    assert_eq!(reopened.get_string("lastTab").as_deref(), Some("main.js"));
}

#[test]
fn non_string_values_are_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("user.toml");
    fs::write(&path, "count = 3\nname = \"demo\"\n[table]\nx = \"y\"\n").expect("write");

    let store = TomlSettingsStore::open(&path).expect("open");

    assert_eq!(store.get_string("count"), None);
    assert_eq!(store.get_string("table"), None);
    assert_eq!(store.get_string("name").as_deref(), Some("demo"));
}

#[test]
fn invalid_toml_is_a_settings_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("user.toml");
    fs::write(&path, "name = ").expect("write");

    let err = TomlSettingsStore::open(&path).expect_err("invalid toml");

    assert!(matches!(err, AppError::Settings(_)));
}

#[test]
fn save_without_changes_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("user.toml");

    let mut store = TomlSettingsStore::open(&path).expect("open");
    store.save().expect("save");

    assert!(!path.exists());
}

#[test]
fn memory_store_counts_saves() {
    let mut store = MemorySettingsStore::new();
    store.set_value("k", "v".into());
    store.save().expect("save");
    store.save().expect("save");

    assert_eq!(store.get_string("k").as_deref(), Some("v"));
    assert_eq!(store.save_count(), 2);
}
