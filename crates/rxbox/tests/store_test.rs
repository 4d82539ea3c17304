//! Integration tests for the store's public contract.
//!
//! Covers merging, key-path change notification, history bounding,
//! isolation of returned state, and subscription lifecycle.

use parking_lot::Mutex;
use proptest::prelude::*;
use rxbox::prelude::*;
use rxbox::Observer;
use serde_json::{json, Value};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

mod support {
    //! Shared helpers for recording emissions.

    use super::*;

    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    pub fn map(v: Value) -> State {
        match v {
            Value::Object(m) => m,
            other => panic!("expected object, got {other}"),
        }
    }

    /// Subscribe and collect every emission.
    pub fn record(store: &Store, path: Option<&str>) -> (Subscription, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = store.watch(path, move |v: &Value| sink.lock().push(v.clone()));
        (sub, seen)
    }
}

use support::{init_tracing, map, record};

#[test]
fn assigned_value_is_readable() {
    init_tracing();
    let store = Store::with_config(StoreConfig::default().debug(true));
    store.assign_state(&json!({"foo": 1})).unwrap();
    assert_eq!(store.get_state()["foo"], json!(1));
}

#[test]
fn relevance_short_circuit() {
    let store = Store::new();
    store.assign_state(&json!({"a": {"b": 1}})).unwrap();
    let (_sub, seen) = record(&store, Some("a.b"));

    store.assign_state(&json!({"c": 1})).unwrap();
    assert!(seen.lock().is_empty());
}

#[test]
fn value_change_emits_once() {
    let store = Store::new();
    let (_sub, seen) = record(&store, Some("foo"));

    store.assign_state(&json!({"foo": 1})).unwrap();
    store.assign_state(&json!({"foo": 1})).unwrap();
    assert_eq!(*seen.lock(), vec![json!(1)]);
}

#[test]
fn deep_value_change_detection() {
    let store = Store::new();
    store
        .assign_state(&json!({"cfg": {"list": [1, {"b": 2}], "name": "x"}}))
        .unwrap();
    let (_sub, seen) = record(&store, Some("cfg.list[1].b"));

    // Same nested value, freshly built: no emission.
    store
        .assign_state(&json!({"cfg": {"list": [1, {"b": 2}], "name": "y"}}))
        .unwrap();
    assert!(seen.lock().is_empty());

    store
        .assign_state(&json!({"cfg": {"list": [1, {"b": 3}], "name": "y"}}))
        .unwrap();
    assert_eq!(*seen.lock(), vec![json!(3)]);
}

#[test]
fn integer_and_float_forms_are_the_same_value() {
    let store = Store::new();
    store.assign_state(&json!({"n": 1})).unwrap();
    let (_sub, seen) = record(&store, Some("n"));

    store.assign_state(&json!({"n": 1.0})).unwrap();
    assert!(seen.lock().is_empty());
}

#[test]
fn null_is_a_change_from_absent_and_back() {
    let store = Store::new();
    store.assign_state(&json!({"a": {}})).unwrap();
    let (_sub, seen) = record(&store, Some("a"));

    store.assign_state(&json!({"a": null})).unwrap();
    store.assign_state(&json!({"a": null})).unwrap();
    store.assign_state(&json!({"a": {}})).unwrap();
    assert_eq!(*seen.lock(), vec![Value::Null, json!({})]);
}

#[test]
fn whole_state_watch_sees_every_distinct_state() {
    let store = Store::new();
    let (_sub, seen) = record(&store, None);

    store.assign_state(&json!({"a": 1})).unwrap();
    store.assign_state(&json!({"b": 2})).unwrap();
    assert_eq!(*seen.lock(), vec![json!({"a": 1}), json!({"a": 1, "b": 2})]);
}

#[test]
fn independent_subscriptions() {
    let store = Store::new();
    let (_a, seen_a) = record(&store, Some("a"));
    let (_b, seen_b) = record(&store, Some("b"));
    let (_a2, seen_a2) = record(&store, Some("a"));

    store.assign_state(&json!({"a": 1})).unwrap();
    store.assign_state(&json!({"b": 1})).unwrap();

    assert_eq!(*seen_a.lock(), vec![json!(1)]);
    assert_eq!(*seen_b.lock(), vec![json!(1)]);
    assert_eq!(*seen_a2.lock(), vec![json!(1)]);
}

#[test]
fn clear_state_notifies_removed_paths() {
    let store = Store::new();
    store.assign_state(&json!({"a": 1, "b": 2})).unwrap();
    let (_a, seen_a) = record(&store, Some("a"));
    let (_z, seen_z) = record(&store, Some("z"));
    let (_all, seen_all) = record(&store, None);

    store.clear_state();

    assert_eq!(*seen_a.lock(), vec![Value::Null]);
    assert!(seen_z.lock().is_empty());
    assert_eq!(*seen_all.lock(), vec![json!({})]);
    assert!(store.get_state().is_empty());
}

#[test]
fn removed_leaf_under_touched_root_is_not_notified() {
    let store = Store::new();
    store.assign_state(&json!({"a": {"b": 1}})).unwrap();
    let (_sub, seen) = record(&store, Some("a.b"));

    // The delta touches "a" but "a.b" does not resolve in it.
    store.assign_state(&json!({"a": {}})).unwrap();

    assert!(seen.lock().is_empty());
    assert_eq!(store.get("a.b"), None);
}

#[test]
fn history_bounding_normal_mode() {
    let store = Store::new();
    for n in 0..10 {
        store.assign_state(&json!({"n": n})).unwrap();
        assert!(store.get_history().len() <= 1);
    }
}

#[test]
fn history_bounding_debug_mode() {
    let store = Store::new();
    store.set_debug(true);
    for n in 0..10 {
        store.assign_state(&json!({"n": n})).unwrap();
    }
    assert_eq!(store.get_history().len(), 10);

    store.set_debug(false);
    store.assign_state(&json!({"n": 99})).unwrap();
    assert_eq!(store.get_history(), vec![map(json!({"n": 9}))]);
}

#[test]
fn clear_history_then_change_detection_still_works() {
    let store = Store::with_config(StoreConfig::default().debug(true));
    store.assign_state(&json!({"k": 1})).unwrap();
    store.clear_history();
    assert!(store.get_history().is_empty());
    assert_eq!(store.get("k"), Some(json!(1)));

    let (_sub, seen) = record(&store, Some("k"));
    store.assign_state(&json!({"k": 1})).unwrap();
    store.assign_state(&json!({"k": 2})).unwrap();
    assert_eq!(*seen.lock(), vec![json!(2)]);
}

#[test]
fn returned_patches_replay_history() {
    let store = Store::with_config(StoreConfig::default().debug(true));
    let patches = vec![
        store.assign_state(&json!({"a": 1, "list": [1, 2]})).unwrap(),
        store.assign_state(&json!({"list": [2]})).unwrap(),
        store.clear_state(),
        store.assign_state(&json!({"b": {"c": true}})).unwrap(),
    ];

    let history = store.get_history();
    let mut replayed = history[0].clone();
    for (step, patch) in patches.iter().enumerate() {
        patch.apply_to(&mut replayed).unwrap();
        let expected = history.get(step + 1).cloned().unwrap_or_else(|| store.get_state());
        assert_eq!(replayed, expected, "after step {step}");
    }
}

#[test]
fn no_op_clear() {
    let store = Store::new();
    store.assign_state(&json!({"x": [1, 2, 3]})).unwrap();

    store.clear_state();
    assert!(store.get_state().is_empty());

    store.assign_state(&json!({"y": true})).unwrap();
    store.clear_history();
    assert!(store.get_history().is_empty());
    assert_eq!(Value::Object(store.get_state()), json!({"y": true}));
}

#[test]
fn returned_state_is_isolated() {
    let store = Store::new();
    store.assign_state(&json!({"nested": {"list": [1]}})).unwrap();

    let mut copy = store.get_state();
    if let Some(Value::Object(nested)) = copy.get_mut("nested") {
        nested.insert("list".into(), json!([]));
    }
    copy.clear();

    assert_eq!(
        Value::Object(store.get_state()),
        json!({"nested": {"list": [1]}})
    );

    let mut history = store.get_history();
    history.clear();
    assert_eq!(store.history_len(), 1);
}

#[test]
fn emitted_values_are_copies() {
    let store = Store::new();
    let (_sub, seen) = record(&store, None);
    store.assign_state(&json!({"a": [1]})).unwrap();

    seen.lock()[0]["a"] = json!("changed");
    assert_eq!(store.get("a"), Some(json!([1])));
}

#[test]
fn unsubscribe_stops_only_that_observer() {
    let store = Store::new();
    let (a, seen_a) = record(&store, Some("v"));
    let (_b, seen_b) = record(&store, Some("v"));

    store.assign_state(&json!({"v": 1})).unwrap();
    assert!(a.unsubscribe());
    store.assign_state(&json!({"v": 2})).unwrap();

    assert_eq!(*seen_a.lock(), vec![json!(1)]);
    assert_eq!(*seen_b.lock(), vec![json!(1), json!(2)]);
    assert_eq!(store.get("v"), Some(json!(2)));
}

#[test]
fn unsubscribe_from_inside_callback() {
    let store = Store::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

    let counter = Arc::clone(&hits);
    let own = Arc::clone(&slot);
    let sub = store.watch_all(move |_: &Value| {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(sub) = own.lock().as_ref() {
            sub.unsubscribe();
        }
    });
    *slot.lock() = Some(sub);
    let (_other, seen_other) = record(&store, None);

    store.assign_state(&json!({"n": 1})).unwrap();
    store.assign_state(&json!({"n": 2})).unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(seen_other.lock().len(), 2);
}

#[test]
fn mutation_from_inside_callback_is_delivered_in_order() {
    let store = Store::new();
    let (_log, seen) = record(&store, None);

    let inner = store.clone();
    let _chain = store.watch_path("step", move |step: &Value| {
        if step == &json!(1) {
            inner.assign_state(&json!({"step": 2})).unwrap();
        }
    });

    store.assign_state(&json!({"step": 1})).unwrap();

    assert_eq!(*seen.lock(), vec![json!({"step": 1}), json!({"step": 2})]);
    assert_eq!(store.get("step"), Some(json!(2)));
    assert_eq!(store.revision(), 2);
}

#[test]
fn panicking_observer_does_not_starve_later_subscribers() {
    let store = Store::new();
    let _boom = store.watch_path("boom", |_: &Value| panic!("observer failure"));
    let (_all, seen) = record(&store, None);

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
        store.assign_state(&json!({"boom": 1}))
    }));
    assert!(outcome.is_err());
    assert_eq!(store.get_state(), map(json!({"boom": 1})));
    assert_eq!(store.revision(), 1);
    assert_eq!(*seen.lock(), vec![json!({"boom": 1})]);

    store.assign_state(&json!({"next": 1})).unwrap();
    assert_eq!(
        *seen.lock(),
        vec![json!({"boom": 1}), json!({"boom": 1, "next": 1})]
    );
}

#[test]
fn publications_queued_by_a_panicking_observer_are_still_delivered() {
    let store = Store::new();
    let inner = store.clone();
    let _boom = store.watch_path("boom", move |_: &Value| {
        inner.assign_state(&json!({"after": 1})).unwrap();
        panic!("observer failure");
    });
    let (_all, seen) = record(&store, None);

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
        store.assign_state(&json!({"boom": 1}))
    }));
    assert!(outcome.is_err());
    assert_eq!(
        *seen.lock(),
        vec![json!({"boom": 1}), json!({"boom": 1, "after": 1})]
    );
    assert_eq!(store.revision(), 2);
}

#[test]
fn reading_store_from_callback_sees_new_state() {
    let store = Store::new();
    let reads = Arc::new(Mutex::new(Vec::new()));

    let reader = store.clone();
    let sink = Arc::clone(&reads);
    let _sub = store.watch_path("x", move |_: &Value| {
        sink.lock().push(reader.get("x"));
    });

    store.assign_state(&json!({"x": "new"})).unwrap();
    assert_eq!(*reads.lock(), vec![Some(json!("new"))]);
}

#[test]
fn shared_observer_type_can_be_reused() {
    let store = Store::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let observer: Observer = Arc::new(move |_: &Value| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let o1 = Arc::clone(&observer);
    let o2 = Arc::clone(&observer);
    let _a = store.watch_path("a", move |v: &Value| o1(v));
    let _b = store.watch_path("b", move |v: &Value| o2(v));

    store.assign_state(&json!({"a": 1, "b": 1})).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn concurrent_writers_deliver_every_distinct_state_in_revision_order() {
    let store = Store::new();
    let (_sub, seen) = record(&store, Some("counter"));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..25 {
                    store
                        .assign_state(&json!({"counter": t * 100 + i}))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.revision(), 100);
    // Every value is distinct, so every mutation is a visible change.
    assert_eq!(seen.lock().len(), 100);
    assert_eq!(seen.lock().last().cloned(), store.get("counter"));
}

proptest! {
    #[test]
    fn merge_correctness(
        base in prop::collection::btree_map("[a-f]", any::<i32>(), 0..6),
        delta in prop::collection::btree_map("[a-f]", any::<i32>(), 0..6),
    ) {
        let base: State = base.into_iter().map(|(k, v)| (k, json!(v))).collect();
        let delta: State = delta.into_iter().map(|(k, v)| (k, json!(v))).collect();

        let store = Store::from_state(StoreConfig::default(), base.clone());
        store.assign(delta.clone()).unwrap();
        let state = store.get_state();

        for (key, value) in &delta {
            prop_assert_eq!(state.get(key), Some(value));
        }
        for (key, value) in &base {
            if !delta.contains_key(key) {
                prop_assert_eq!(state.get(key), Some(value));
            }
        }
        prop_assert_eq!(state.len(), base.keys().chain(delta.keys()).collect::<std::collections::BTreeSet<_>>().len());
    }

    #[test]
    fn path_watch_emits_iff_value_changed(old in 0i32..3, new in 0i32..3) {
        let store = Store::new();
        store.assign_state(&json!({"w": {"v": old}})).unwrap();
        let (_sub, seen) = record(&store, Some("w.v"));

        store.assign_state(&json!({"w": {"v": new}})).unwrap();
        let expected = if old == new { vec![] } else { vec![json!(new)] };
        prop_assert_eq!(seen.lock().clone(), expected);
    }
}
