use std::sync::{Arc, Mutex, OnceLock};

use extsurface_core::{ExtensionId, Value};
use extsurface_patch::{Module, ModuleRef, PatchCallback, PatchError, PatchRegistry, PatchTarget};

type Log = Arc<Mutex<Vec<String>>>;

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// A module whose `run` method appends "T" to the log and returns its first argument.
fn logging_module(log: &Log) -> ModuleRef {
    let log = Arc::clone(log);
    Module::new("host")
        .with_method("run", move |args: &[Value]| {
            log.lock().unwrap().push("T".to_string());
            args.first().cloned().unwrap_or_default()
        })
        .into_ref()
}

fn push(log: &Log, entry: &str) -> PatchCallback {
    let log = Arc::clone(log);
    let entry = entry.to_string();
    PatchCallback::before(move |_| {
        log.lock().unwrap().push(entry.clone());
        Ok(())
    })
}

fn push_after(log: &Log, entry: &str) -> PatchCallback {
    let log = Arc::clone(log);
    let entry = entry.to_string();
    PatchCallback::after(move |_, _| {
        log.lock().unwrap().push(entry.clone());
        Ok(None)
    })
}

fn replace_with(value: &'static str) -> PatchCallback {
    PatchCallback::instead(move |_, _| Ok(Value::from(value)))
}

#[test]
fn test_before_and_after_from_two_owners() {
    let log = new_log();
    let module = logging_module(&log);
    let registry = PatchRegistry::new();
    let target = PatchTarget::new(module.clone(), "run");

    registry.attach("p1".into(), target.clone(), push(&log, "a")).unwrap();
    registry.attach("p2".into(), target, push_after(&log, "b")).unwrap();

    module.call("run", &[]).unwrap();
    assert_eq!(entries(&log), vec!["a", "T", "b"]);
}

#[test]
fn test_order_matches_attachment_and_survives_detach() {
    let log = new_log();
    let module = logging_module(&log);
    let registry = PatchRegistry::new();
    let target = PatchTarget::new(module.clone(), "run");

    let owners = ["x", "y", "x", "z"];
    let mut patches = Vec::new();
    for (i, owner) in owners.iter().enumerate() {
        let callback = if i % 2 == 0 {
            push(&log, &format!("before{i}"))
        } else {
            push_after(&log, &format!("after{i}"))
        };
        patches.push(registry.attach((*owner).into(), target.clone(), callback).unwrap());
    }
    patches.push(registry.attach("y".into(), target.clone(), push(&log, "before4")).unwrap());

    module.call("run", &[]).unwrap();
    assert_eq!(
        entries(&log),
        vec!["before0", "before2", "before4", "T", "after1", "after3"]
    );

    log.lock().unwrap().clear();
    registry.detach(&patches[2]);
    module.call("run", &[]).unwrap();
    assert_eq!(entries(&log), vec!["before0", "before4", "T", "after1", "after3"]);
}

#[test]
fn test_instead_last_attached_wins_with_fallback() {
    let log = new_log();
    let module = logging_module(&log);
    let registry = PatchRegistry::new();
    let target = PatchTarget::new(module.clone(), "run");

    let a = registry.attach("a".into(), target.clone(), replace_with("A")).unwrap();
    let b = registry.attach("b".into(), target.clone(), replace_with("B")).unwrap();

    assert_eq!(module.call("run", &[Value::from("orig")]).unwrap(), Value::from("B"));

    registry.detach(&b);
    assert_eq!(module.call("run", &[Value::from("orig")]).unwrap(), Value::from("A"));
    assert!(entries(&log).is_empty(), "original must not run while an instead patch governs");

    registry.detach(&a);
    assert_eq!(module.call("run", &[Value::from("orig")]).unwrap(), Value::from("orig"));
    assert_eq!(entries(&log), vec!["T"]);
}

#[test]
fn test_disabled_instead_is_dormant() {
    let log = new_log();
    let module = logging_module(&log);
    let registry = PatchRegistry::new();
    let target = PatchTarget::new(module.clone(), "run");

    registry.attach("a".into(), target.clone(), replace_with("A")).unwrap();
    let b = registry.attach("b".into(), target, replace_with("B")).unwrap();

    b.disable();
    assert_eq!(module.call("run", &[]).unwrap(), Value::from("A"));
    b.enable();
    assert_eq!(module.call("run", &[]).unwrap(), Value::from("B"));
}

#[test]
fn test_instead_can_call_original() {
    let log = new_log();
    let module = logging_module(&log);
    let registry = PatchRegistry::new();

    registry
        .attach(
            "a".into(),
            PatchTarget::new(module.clone(), "run"),
            PatchCallback::instead(|args, original| {
                let ret = original(args);
                Ok(Value::from(format!("wrapped:{}", ret.as_str().unwrap_or(""))))
            }),
        )
        .unwrap();

    assert_eq!(
        module.call("run", &[Value::from("x")]).unwrap(),
        Value::from("wrapped:x")
    );
    assert_eq!(entries(&log), vec!["T"]);
}

#[test]
fn test_before_mutation_visible_to_instead_and_after() {
    let log = new_log();
    let module = logging_module(&log);
    let registry = PatchRegistry::new();
    let target = PatchTarget::new(module.clone(), "run");
    let seen_by_after = Arc::new(Mutex::new(None));

    registry
        .attach(
            "a".into(),
            target.clone(),
            PatchCallback::before(|args| {
                args[0] = Value::from("mutated");
                Ok(())
            }),
        )
        .unwrap();
    registry
        .attach(
            "b".into(),
            target.clone(),
            PatchCallback::instead(|args, _| Ok(args[0].clone())),
        )
        .unwrap();
    let seen = Arc::clone(&seen_by_after);
    registry
        .attach(
            "c".into(),
            target,
            PatchCallback::after(move |args, _| {
                *seen.lock().unwrap() = Some(args[0].clone());
                Ok(None)
            }),
        )
        .unwrap();

    assert_eq!(
        module.call("run", &[Value::from("input")]).unwrap(),
        Value::from("mutated")
    );
    assert_eq!(*seen_by_after.lock().unwrap(), Some(Value::from("mutated")));
}

#[test]
fn test_after_last_replacement_wins() {
    let log = new_log();
    let module = logging_module(&log);
    let registry = PatchRegistry::new();
    let target = PatchTarget::new(module.clone(), "run");

    registry
        .attach("a".into(), target.clone(), PatchCallback::after(|_, _| Ok(Some(Value::from(1)))))
        .unwrap();
    registry
        .attach(
            "b".into(),
            target.clone(),
            PatchCallback::after(|_, ret| Ok(Some(Value::from(ret.as_i64().unwrap_or(0) + 10)))),
        )
        .unwrap();
    registry
        .attach("c".into(), target, PatchCallback::after(|_, _| Ok(None)))
        .unwrap();

    assert_eq!(module.call("run", &[]).unwrap(), Value::from(11));
}

#[test]
fn test_failing_before_does_not_stop_chain() {
    let log = new_log();
    let module = logging_module(&log);
    let registry = PatchRegistry::new();
    let target = PatchTarget::new(module.clone(), "run");

    let failing = registry
        .attach("bad".into(), target.clone(), PatchCallback::before(|_| Err("broken".into())))
        .unwrap();
    registry.attach("good".into(), target, push(&log, "a")).unwrap();

    assert_eq!(module.call("run", &[Value::from(7)]).unwrap(), Value::from(7));
    assert_eq!(entries(&log), vec!["a", "T"]);
    assert_eq!(failing.failure_count(), 1);
}

#[test]
fn test_detach_all_by_owner_leaves_others_intact() {
    let log = new_log();
    let first = logging_module(&log);
    let second = Module::new("other")
        .with_method("noop", |_: &[Value]| Value::Null)
        .into_ref();
    let registry = PatchRegistry::new();
    let run = PatchTarget::new(first.clone(), "run");
    let noop = PatchTarget::new(second.clone(), "noop");

    registry.attach("x".into(), run.clone(), push(&log, "x1")).unwrap();
    registry.attach("y".into(), run.clone(), push(&log, "y1")).unwrap();
    registry.attach("x".into(), run.clone(), push(&log, "x2")).unwrap();
    registry.attach("y".into(), run.clone(), push(&log, "y2")).unwrap();
    registry.attach("x".into(), noop.clone(), push(&log, "x3")).unwrap();
    registry.attach("y".into(), noop.clone(), push(&log, "y3")).unwrap();

    assert_eq!(registry.detach_all_by_owner(&ExtensionId::new("x")), 3);
    assert!(registry.list_by_owner(&ExtensionId::new("x")).is_empty());
    assert_eq!(registry.list_by_owner(&ExtensionId::new("y")).len(), 3);
    assert_eq!(registry.target_count(), 2);

    first.call("run", &[]).unwrap();
    second.call("noop", &[]).unwrap();
    assert_eq!(entries(&log), vec!["y1", "y2", "T", "y3"]);
}

#[test]
fn test_attach_then_detach_restores_original_identity() {
    let log = new_log();
    let module = logging_module(&log);
    let registry = PatchRegistry::new();
    let original = module.method("run").unwrap();

    let patch = registry
        .attach(
            "a".into(),
            PatchTarget::new(module.clone(), "run"),
            push(&log, "patched"),
        )
        .unwrap();
    assert!(!Arc::ptr_eq(&original, &module.method("run").unwrap()));

    registry.detach(&patch);
    assert!(Arc::ptr_eq(&original, &module.method("run").unwrap()));

    module.call("run", &[]).unwrap();
    assert_eq!(entries(&log), vec!["T"]);
}

#[test]
fn test_invalid_target_does_not_affect_existing_patches() {
    let log = new_log();
    let module = logging_module(&log);
    let registry = PatchRegistry::new();

    registry
        .attach("a".into(), PatchTarget::new(module.clone(), "run"), push(&log, "a"))
        .unwrap();
    let err = registry
        .attach("a".into(), PatchTarget::new(module.clone(), "nope"), push(&log, "b"))
        .unwrap_err();

    assert!(matches!(err, PatchError::InvalidTarget { .. }));
    assert_eq!(registry.len(), 1);
    module.call("run", &[]).unwrap();
    assert_eq!(entries(&log), vec!["a", "T"]);
}

#[test]
fn test_unpatch_all_from_inside_callback() {
    let log = new_log();
    let module = logging_module(&log);
    let registry = Arc::new(PatchRegistry::new());
    let target = PatchTarget::new(module.clone(), "run");

    let reg = Arc::clone(&registry);
    registry
        .attach(
            "self".into(),
            target.clone(),
            PatchCallback::before(move |_| {
                reg.detach_all_by_owner(&ExtensionId::new("self"));
                Ok(())
            }),
        )
        .unwrap();
    registry.attach("self".into(), target.clone(), push(&log, "second")).unwrap();

    // The running call keeps its snapshot; the detach applies to later calls.
    module.call("run", &[]).unwrap();
    assert_eq!(entries(&log), vec!["second", "T"]);
    assert!(!registry.is_patched(&target));

    module.call("run", &[]).unwrap();
    assert_eq!(entries(&log), vec!["second", "T", "T"]);
}

#[test]
fn test_reentrant_call_sees_consistent_chain() {
    let depth = Arc::new(Mutex::new(0));
    let module: Arc<OnceLock<ModuleRef>> = Arc::new(OnceLock::new());
    let inner = Arc::clone(&module);
    let built = Module::new("rec")
        .with_method("count", move |args: &[Value]| {
            let n = args.first().and_then(Value::as_i64).unwrap_or(0);
            if n == 0 {
                return Value::from(0);
            }
            let next = inner
                .get()
                .and_then(|m| m.call("count", &[Value::from(n - 1)]).ok())
                .and_then(|v| v.as_i64())
                .unwrap_or(0);
            Value::from(next + 1)
        })
        .into_ref();
    module.set(Arc::clone(&built)).unwrap();

    let registry = PatchRegistry::new();
    let counter = Arc::clone(&depth);
    registry
        .attach(
            "counter".into(),
            PatchTarget::new(Arc::clone(&built), "count"),
            PatchCallback::before(move |_| {
                *counter.lock().unwrap() += 1;
                Ok(())
            }),
        )
        .unwrap();

    assert_eq!(built.call("count", &[Value::from(3)]).unwrap(), Value::from(3));
    assert_eq!(*depth.lock().unwrap(), 4);
}
