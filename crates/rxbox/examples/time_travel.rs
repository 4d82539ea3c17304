//! Watch a few key paths, then walk and replay the debug history.
//!
//! Run with `RUST_LOG=rxbox=debug cargo run --example time_travel` to see the
//! store's own log lines.

use rxbox::{global, Store, StoreConfig};
use serde_json::{json, Value};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = Store::with_config(StoreConfig::default().debug(true).strict(true));
    global::expose(&store);

    let _todos = store.watch_path("todos", |todos: &Value| {
        let count = todos.as_array().map_or(0, Vec::len);
        println!("todos changed: {count} item(s)");
    });
    let _first = store.watch_path("todos[0].done", |done: &Value| {
        println!("first todo done: {done}");
    });

    let patches = vec![
        store.assign_state(&json!({"todos": [{"title": "write docs", "done": false}]}))?,
        store.assign_state(&json!({"filter": "all"}))?,
        store.assign_state(&json!({"todos": [
            {"title": "write docs", "done": true},
            {"title": "ship", "done": false}
        ]}))?,
    ];

    if let Err(err) = store.assign_state(&json!({"bad.key": 1})) {
        println!("rejected: {err}");
    }

    for (revision, past) in store.get_history().iter().enumerate() {
        println!("history[{revision}] = {}", Value::Object(past.clone()));
    }
    println!("current = {}", Value::Object(store.get_state()));

    // Rebuild the current state from the first snapshot and the patches.
    let mut replayed = store.get_history().into_iter().next().unwrap_or_default();
    for patch in &patches {
        patch.apply_to(&mut replayed)?;
    }
    println!("replayed matches current: {}", replayed == store.get_state());

    if let Some(exposed) = global::exposed() {
        println!("{}", exposed.debug_view().to_json_pretty()?);
    }
    Ok(())
}
