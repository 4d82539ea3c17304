//! Optional process-wide debug handle.
//!
//! External tooling (a REPL, an inspector endpoint) can find a store through
//! this side channel without it being threaded through the application.
//! Nothing in the store depends on it.
//!
//! ```rust
//! use rxbox::{global, Store};
//! use serde_json::json;
//!
//! let store = Store::new();
//! global::expose(&store);
//!
//! store.assign_state(&json!({"ready": true})).unwrap();
//! let view = global::exposed().expect("store exposed").debug_view();
//! assert_eq!(view.name, global::GLOBAL_NAME);
//! assert_eq!(view.state["ready"], json!(true));
//!
//! global::withdraw();
//! ```

use crate::store::Store;
use parking_lot::RwLock;
use rxbox_core::types::StoreId;
use rxbox_core::State;
use serde::Serialize;
use tracing::debug;

/// Name under which the store is exposed to debugging tools.
pub const GLOBAL_NAME: &str = "RXBox";

static EXPOSED: RwLock<Option<Store>> = parking_lot::const_rwlock(None);

/// Expose `store` as the process-wide debug handle.
///
/// Returns the previously exposed store, if any.
pub fn expose(store: &Store) -> Option<Store> {
    debug!(store_id = %store.id(), name = GLOBAL_NAME, "store exposed");
    EXPOSED.write().replace(store.clone())
}

/// The currently exposed store.
#[must_use]
pub fn exposed() -> Option<Store> {
    EXPOSED.read().clone()
}

/// Remove the process-wide handle, returning it.
pub fn withdraw() -> Option<Store> {
    let previous = EXPOSED.write().take();
    if let Some(store) = &previous {
        debug!(store_id = %store.id(), "store withdrawn");
    }
    previous
}

/// Serializable picture of a store for external inspection.
#[derive(Debug, Clone, Serialize)]
pub struct DebugView {
    /// Always [`GLOBAL_NAME`].
    pub name: &'static str,
    /// The store's id.
    pub store_id: StoreId,
    /// Mutations applied so far.
    pub revision: u64,
    /// Whether every past state is kept.
    pub debug: bool,
    /// Active subscriptions.
    pub subscribers: usize,
    /// The current state.
    pub state: State,
    /// Past states, oldest first.
    pub history: Vec<State>,
}

impl DebugView {
    /// Render as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if rendering fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Store {
    /// Capture a [`DebugView`] of this store.
    #[must_use]
    pub fn debug_view(&self) -> DebugView {
        DebugView {
            name: GLOBAL_NAME,
            store_id: self.id(),
            revision: self.revision(),
            debug: self.is_debug(),
            subscribers: self.subscriber_count(),
            state: self.get_state(),
            history: self.get_history(),
        }
    }
}
