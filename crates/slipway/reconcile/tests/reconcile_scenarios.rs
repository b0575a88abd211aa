//! End-to-end reconciliation scenarios against real files.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};

use slipway_reconcile::{ConfigDocument, ConfigError, ConfigReconciler, ReconcileOptions};
use slipway_types::ServiceDescriptor;

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn descriptor() -> ServiceDescriptor {
    ServiceDescriptor::http("svc", "http://localhost/mcp")
}

#[test]
fn empty_target_produces_minimal_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mcp.json");

    let reconciler = ConfigReconciler::new(ReconcileOptions::default());
    let result = reconciler.reconcile_servers(&path, &descriptor()).unwrap();

    assert!(result.changed);
    assert!(result.backup.is_none());
    assert_eq!(
        read_json(&path),
        json!({"servers": {"svc": {"type": "http", "url": "http://localhost/mcp"}}})
    );
}

#[test]
fn unrelated_content_survives_the_merge() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mcp.json");
    fs::write(
        &path,
        r#"{"servers":{"other":{"type":"http","url":"https://x"}},"theme":"dark"}"#,
    )
    .unwrap();

    let reconciler = ConfigReconciler::new(ReconcileOptions::default());
    let result = reconciler.reconcile_servers(&path, &descriptor()).unwrap();

    assert!(result.changed);
    let root = read_json(&path);
    assert_eq!(root["theme"], "dark");
    assert_eq!(
        root["servers"]["other"],
        json!({"type": "http", "url": "https://x"})
    );
    assert_eq!(
        root["servers"]["svc"],
        json!({"type": "http", "url": "http://localhost/mcp"})
    );
}

#[test]
fn conflicting_entry_without_consent_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mcp.json");
    let original = r#"{"servers":{"svc":{"type":"http","url":"https://elsewhere"}}}"#;
    fs::write(&path, original).unwrap();

    let reconciler = ConfigReconciler::new(ReconcileOptions::default());
    let err = reconciler.reconcile_servers(&path, &descriptor()).unwrap_err();

    assert!(matches!(err, ConfigError::ExistingEntryConflict { .. }));
    // File untouched, and no backup since no write occurred.
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn backup_is_taken_before_the_write_and_byte_matches() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mcp.json");
    let original = r#"{"servers":{},"keybindings":[{"key":"ctrl+k"}]}"#;
    fs::write(&path, original).unwrap();

    let reconciler = ConfigReconciler::new(ReconcileOptions::default());
    let result = reconciler.reconcile_servers(&path, &descriptor()).unwrap();

    let backup = result.backup.unwrap();
    assert_eq!(fs::read_to_string(&backup.backup_path).unwrap(), original);
    assert_ne!(fs::read_to_string(&path).unwrap(), original);
    assert_eq!(read_json(&path)["keybindings"], json!([{"key": "ctrl+k"}]));
}

#[test]
fn merge_preserves_many_unrelated_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mcp.json");

    let mut root = serde_json::Map::new();
    for i in 0..8 {
        root.insert(format!("top_{i}"), json!(i));
    }
    let mut servers = serde_json::Map::new();
    for i in 0..5 {
        servers.insert(format!("peer_{i}"), json!({"type": "http", "url": format!("https://{i}")}));
    }
    root.insert("servers".into(), Value::Object(servers));
    fs::write(&path, serde_json::to_string(&root).unwrap()).unwrap();

    let reconciler = ConfigReconciler::new(ReconcileOptions::default());
    reconciler.reconcile_servers(&path, &descriptor()).unwrap();

    let after = read_json(&path);
    for i in 0..8 {
        assert_eq!(after[format!("top_{i}")], json!(i));
    }
    for i in 0..5 {
        assert_eq!(after["servers"][format!("peer_{i}")]["url"], format!("https://{i}"));
    }
    assert_eq!(after["servers"]["svc"]["url"], "http://localhost/mcp");
    assert_eq!(after["servers"].as_object().unwrap().len(), 6);
}

#[test]
fn failed_write_leaves_destination_untouched_and_no_temp() {
    // The write discipline is temp-then-rename. Occupy the destination
    // with a non-empty directory so the final rename cannot succeed:
    // the write must fail, the destination must be undisturbed, and no
    // temp file may survive.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mcp.json");
    fs::create_dir(&path).unwrap();
    fs::write(path.join("sentinel"), "keep").unwrap();

    let mut document = ConfigDocument::empty(&path);
    document.root_mut().insert("servers".into(), json!({}));

    assert!(document.write_atomic().is_err());
    assert_eq!(fs::read_to_string(path.join("sentinel")).unwrap(), "keep");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn rerunning_reconciliation_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mcp.json");

    let reconciler = ConfigReconciler::new(ReconcileOptions::default());
    let first = reconciler.reconcile_servers(&path, &descriptor()).unwrap();
    assert!(first.changed);
    let content_after_first = fs::read_to_string(&path).unwrap();

    let second = reconciler.reconcile_servers(&path, &descriptor()).unwrap();
    assert!(!second.changed);
    assert_eq!(fs::read_to_string(&path).unwrap(), content_after_first);
}
