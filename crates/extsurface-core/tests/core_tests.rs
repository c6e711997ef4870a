use extsurface_core::{
    ExtensionIdentity, ResourceKind, ResourceStack, StackHandle, SurfaceConfig, Value, utils,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_remove_all_tolerates_reentrant_remove() {
    let stack = ResourceStack::new(ResourceKind::Modal);
    let handles: Vec<StackHandle> = ["a", "b", "c", "d"].iter().map(|s| stack.push(*s)).collect();

    let mut destroyed = Vec::new();
    let report = stack.remove_all(|item| -> Result<(), ()> {
        destroyed.push(*item);
        // Destroying "a" synchronously removes the not yet processed "c".
        if *item == "a" {
            stack.remove(handles[2]);
        }
        Ok(())
    });

    assert!(report.is_clean());
    assert_eq!(report.destroyed, 4);
    assert_eq!(destroyed, vec!["a", "b", "c", "d"]);
    assert!(stack.is_empty());
}

#[test]
fn test_remove_all_leaves_items_pushed_during_teardown() {
    let stack = ResourceStack::new(ResourceKind::MenuItem);
    stack.push(1);
    stack.push(2);

    let pushed = RefCell::new(None);
    let report = stack.remove_all(|item| -> Result<(), ()> {
        if *item == 1 {
            *pushed.borrow_mut() = Some(stack.push(99));
        }
        Ok(())
    });

    assert_eq!(report.destroyed, 2);
    assert_eq!(stack.list(), vec![99]);
    assert!(stack.contains(pushed.into_inner().unwrap()));
}

#[test]
fn test_remove_all_on_empty_stack() {
    let stack: ResourceStack<String> = ResourceStack::new(ResourceKind::Style);
    let report = stack.remove_all(|_| -> Result<(), String> { Ok(()) });

    assert_eq!(report.destroyed, 0);
    assert!(report.is_clean());
}

#[test]
fn test_duplicate_items_are_distinct_handles() {
    let stack = ResourceStack::new(ResourceKind::Style);
    let first = stack.push("same");
    let second = stack.push("same");

    stack.remove(first);
    assert!(!stack.contains(first));
    assert!(stack.contains(second));
    assert_eq!(stack.len(), 1);
}

#[test]
fn test_identity_reload() {
    let identity = ExtensionIdentity::new("clock", "Clock", "/plugins/clock");
    let reloaded = identity.reloaded().reloaded();

    assert_eq!(reloaded.generation, 2);
    assert_eq!(reloaded.path, identity.path);
}

#[test]
fn test_config_load_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = SurfaceConfig::load(&dir.path().join("missing.toml")).unwrap();
    assert_eq!(config, SurfaceConfig::default());
}

#[test]
fn test_config_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "style_prefix = \"ext\"").unwrap();
    writeln!(file, "force_close_on_teardown = false").unwrap();

    let config = SurfaceConfig::load(file.path()).unwrap();
    assert_eq!(config.style_prefix, "ext");
    assert!(!config.force_close_on_teardown);
    assert_eq!(config.style_id("clock", "main"), "ext-clock-main");
}

#[test]
fn test_utils_round_trip_object() {
    let parsed = utils::try_parse_json(r#"{"enabled": true, "count": 2}"#).unwrap();

    let mut expected = HashMap::new();
    expected.insert("enabled".to_string(), Value::Bool(true));
    expected.insert("count".to_string(), Value::Float(2.0));

    assert!(utils::deep_compare(&parsed, &Value::Object(expected)));
}
