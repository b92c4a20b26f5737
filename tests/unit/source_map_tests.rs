//! Unit tests for source map loading and lookup.

use std::fs;

use sphere_debug::paths::SourceMap;
use sphere_debug::AppError;

#[test]
fn entries_keep_file_order() {
    let map = SourceMap::from_json_str(r#"{"z.js": "out/z.js", "a.js": "out/a.js"}"#)
        .expect("valid map");

    let keys: Vec<&str> = map.iter().map(|(key, _)| key).collect();

    assert_eq!(keys, ["z.js", "a.js"]);
}

#[test]
fn lookup_and_reverse_lookup() {
    let map = SourceMap::from_json_str(r#"{"scripts/main.js": "build/main.js"}"#)
        .expect("valid map");

    assert_eq!(map.lookup("scripts/main.js"), Some("build/main.js"));
    assert_eq!(map.reverse_lookup("build/main.js"), Some("scripts/main.js"));
    assert_eq!(map.lookup("missing.js"), None);
    assert_eq!(map.reverse_lookup("missing.js"), None);
}

#[test]
fn backslashes_are_normalized() {
    let map = SourceMap::from_json_str(r#"{"lib\\a.js": "build\\lib\\a.js"}"#)
        .expect("valid map");

    assert_eq!(map.lookup("lib/a.js"), Some("build/lib/a.js"));
}

#[test]
fn non_string_values_are_skipped() {
    let map = SourceMap::from_json_str(r#"{"a.js": 3, "b.js": "out/b.js", "c.js": null}"#)
        .expect("valid map");

    assert_eq!(map.len(), 1);
    assert_eq!(map.lookup("b.js"), Some("out/b.js"));
}

#[test]
fn non_object_json_is_rejected() {
    let err = SourceMap::from_json_str(r#"["a.js"]"#).expect_err("array is not a map");

    assert!(matches!(err, AppError::SourceMap(_)));
}

#[test]
fn load_tolerates_missing_and_malformed_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("sourcemap.json");
    assert!(SourceMap::load(&missing).is_empty());

    fs::write(&missing, "{ not json").expect("write");
    assert!(SourceMap::load(&missing).is_empty());

    fs::write(&missing, r#"{"a.js": "build/a.js"}"#).expect("write");
    assert_eq!(SourceMap::load(&missing).lookup("a.js"), Some("build/a.js"));
}
