//! The state store: sole owner and writer of the current state.

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::history::HistoryBuffer;
use crate::notifier::{
    ChangeSet, Notifier, Publication, Sink, Subscription, WatchStream,
};
use crate::patch::StatePatch;
use parking_lot::RwLock;
use rxbox_core::equality::maps_equal;
use rxbox_core::merge::{into_delta, shallow_merge};
use rxbox_core::types::StoreId;
use rxbox_core::validate::validate_delta;
use rxbox_core::{KeyPath, State};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

/// In-memory application state with key-path change subscriptions.
///
/// The state is always a map at its root. Mutations are shallow merges
/// ([`assign`](Self::assign)) or a reset ([`clear_state`](Self::clear_state));
/// each one pushes the previous state into history and publishes the new
/// state to every subscription. Publications are delivered before the
/// mutating call returns, unless another call is already delivering (an
/// observer mutating the store, or a second thread): the publication is then
/// queued and delivered by that call, in mutation order.
///
/// `Store` is a cheap handle: clones share one underlying state. Separately
/// constructed stores never share anything.
///
/// # Example
///
/// ```rust
/// use rxbox::Store;
/// use serde_json::{json, Value};
/// use std::sync::{Arc, Mutex};
///
/// let store = Store::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = Arc::clone(&seen);
/// let sub = store.watch_path("user.name", move |name: &Value| {
///     sink.lock().unwrap().push(name.clone());
/// });
///
/// store.assign_state(&json!({"user": {"name": "ana"}})).unwrap();
/// store.assign_state(&json!({"user": {"name": "ana"}})).unwrap(); // unchanged
/// store.assign_state(&json!({"other": 1})).unwrap(); // path not touched
/// store.assign_state(&json!({"user": {"name": "bo"}})).unwrap();
///
/// assert_eq!(*seen.lock().unwrap(), vec![json!("ana"), json!("bo")]);
/// sub.unsubscribe();
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

struct Inner {
    id: StoreId,
    strict: bool,
    max_depth: usize,
    debug: AtomicBool,
    state: RwLock<StoreState>,
    notifier: Arc<Notifier>,
}

struct StoreState {
    current: Arc<State>,
    history: HistoryBuffer,
    last_delta: Option<Arc<State>>,
    revision: u64,
}

impl StoreState {
    /// Swap in `next`, record history, and build the publication unless the
    /// new state equals the old one.
    fn commit(&mut self, next: Arc<State>, changes: ChangeSet, debug: bool) -> Option<Publication> {
        let previous = std::mem::replace(&mut self.current, Arc::clone(&next));
        self.history.push(Arc::clone(&previous), debug);
        self.revision += 1;
        if let ChangeSet::Assigned(delta) = &changes {
            self.last_delta = Some(Arc::clone(delta));
        }

        if maps_equal(&previous, &next) {
            return None;
        }
        Some(Publication {
            revision: self.revision,
            state: next,
            previous,
            changes,
        })
    }
}

impl Store {
    /// Create an empty store with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty store.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self::from_state(config, State::new())
    }

    /// Create a store that starts from `initial`.
    ///
    /// The initial state is not a mutation: history starts empty and no
    /// publication is made.
    #[must_use]
    pub fn from_state(config: StoreConfig, initial: State) -> Self {
        let id = StoreId::random();
        debug!(
            store_id = %id,
            debug = config.debug,
            strict = config.strict,
            "store created"
        );
        Self {
            inner: Arc::new(Inner {
                id,
                strict: config.strict,
                max_depth: config.max_depth,
                debug: AtomicBool::new(config.debug),
                state: RwLock::new(StoreState {
                    current: Arc::new(initial),
                    history: HistoryBuffer::with_limit(config.history_limit),
                    last_delta: None,
                    revision: 0,
                }),
                notifier: Arc::new(Notifier::new(id)),
            }),
        }
    }

    /// This store's id.
    #[must_use]
    pub fn id(&self) -> StoreId {
        self.inner.id
    }


    /// A deep copy of the current state.
    ///
    /// Mutating the returned map never affects the store.
    #[must_use]
    pub fn get_state(&self) -> State {
        State::clone(&self.inner.state.read().current)
    }

    /// The current state converted into a caller type.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Deserialize`] if the state does not fit `T`.
    pub fn get_state_as<T: DeserializeOwned>(&self) -> StoreResult<T> {
        serde_json::from_value(Value::Object(self.get_state())).map_err(|e| {
            StoreError::Deserialize {
                reason: e.to_string(),
            }
        })
    }

    /// An immutable shared snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> Arc<State> {
        Arc::clone(&self.inner.state.read().current)
    }

    /// Read the current state in place.
    ///
    /// The closure runs under the read lock; it must not mutate the store.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&State) -> R,
    {
        let guard = self.inner.state.read();
        f(&guard.current)
    }

    /// A copy of the value at `path`, or `None` if absent.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Value> {
        let path = KeyPath::parse(path);
        self.read(|state| path.resolve_in(state).cloned())
    }

    /// The delta of the most recent [`assign`](Self::assign).
    #[must_use]
    pub fn last_delta(&self) -> Option<State> {
        self.inner
            .state
            .read()
            .last_delta
            .as_deref()
            .cloned()
    }

    /// Number of mutations applied so far.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.state.read().revision
    }


    /// Shallow-merge `delta` into the state and publish the result.
    ///
    /// Returns the JSON Patch from the previous state to the new one.
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`StoreError::Core`] if the delta has keys
    /// containing key-path syntax or nests deeper than `max_depth`. Nothing
    /// is merged, recorded, or published on error.
    pub fn assign(&self, delta: State) -> StoreResult<StatePatch> {
        if self.inner.strict {
            if let Err(err) = validate_delta(&delta, self.inner.max_depth) {
                warn!(store_id = %self.inner.id, error = %err, "delta rejected");
                return Err(err.into());
            }
        }

        let delta = Arc::new(delta);
        let debug = self.is_debug();
        let patch = {
            let mut guard = self.inner.state.write();
            let merged = Arc::new(shallow_merge(&guard.current, &delta));
            let patch = StatePatch::for_keys(&guard.current, &merged, delta.keys());
            let publication = guard.commit(merged, ChangeSet::Assigned(Arc::clone(&delta)), debug);
            debug!(
                store_id = %self.inner.id,
                revision = guard.revision,
                keys = delta.len(),
                published = publication.is_some(),
                "state assigned"
            );
            if let Some(publication) = publication {
                self.inner.notifier.enqueue(publication);
            }
            patch
        };

        self.inner.notifier.flush();
        Ok(patch)
    }

    /// Serialize `delta` and shallow-merge it into the state.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Serialization`] if `delta` fails to serialize
    /// - [`StoreError::Core`] if it is not a map, or fails strict validation
    ///
    /// # Example
    ///
    /// ```rust
    /// use rxbox::Store;
    /// use serde_json::json;
    ///
    /// let store = Store::new();
    /// store.assign_state(&json!({"foo": 1})).expect("delta is a map");
    /// assert_eq!(store.get_state()["foo"], json!(1));
    ///
    /// assert!(store.assign_state(&json!([1, 2])).is_err());
    /// ```
    pub fn assign_state<T>(&self, delta: &T) -> StoreResult<StatePatch>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(delta).map_err(|e| StoreError::Serialization {
            reason: e.to_string(),
        })?;
        let delta = into_delta(value).inspect_err(|err| {
            warn!(store_id = %self.inner.id, error = %err, "delta rejected");
        })?;
        self.assign(delta)
    }

    /// Reset the state to an empty map and publish it.
    ///
    /// History is kept; the state before the reset is pushed like any other
    /// mutation.
    pub fn clear_state(&self) -> StatePatch {
        let debug = self.is_debug();
        let patch = {
            let mut guard = self.inner.state.write();
            let empty = Arc::new(State::new());
            let patch = StatePatch::between(&guard.current, &empty);
            let publication = guard.commit(empty, ChangeSet::Cleared, debug);
            debug!(
                store_id = %self.inner.id,
                revision = guard.revision,
                published = publication.is_some(),
                "state cleared"
            );
            if let Some(publication) = publication {
                self.inner.notifier.enqueue(publication);
            }
            patch
        };

        self.inner.notifier.flush();
        patch
    }


    /// Past states, oldest first, as deep copies.
    #[must_use]
    pub fn get_history(&self) -> Vec<State> {
        self.inner
            .state
            .read()
            .history
            .iter()
            .map(|snapshot| State::clone(snapshot))
            .collect()
    }

    /// Number of past states held.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.inner.state.read().history.len()
    }

    /// Forget every past state. The current state is untouched.
    pub fn clear_history(&self) {
        self.inner.state.write().history.clear();
        debug!(store_id = %self.inner.id, "history cleared");
    }

    /// Check whether every past state is being kept.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.inner.debug.load(Ordering::Acquire)
    }

    /// Switch between keeping every past state (`true`) and only the
    /// previous one (`false`).
    ///
    /// Turning debug off collapses history to one entry on the next mutation.
    pub fn set_debug(&self, enabled: bool) {
        self.inner.debug.store(enabled, Ordering::Release);
        debug!(store_id = %self.inner.id, debug = enabled, "debug flag set");
    }


    /// Subscribe to the whole state (`path == None`) or to one key path.
    ///
    /// A whole-state observer receives every published state. A key-path
    /// observer receives the new value at its path only when the mutation's
    /// delta reaches the path and the value is structurally different from
    /// before. After [`clear_state`](Self::clear_state), a path that held a
    /// value receives `null`.
    ///
    /// Observers run synchronously on the mutating thread with no store
    /// locks held; they may read, mutate, or unsubscribe.
    pub fn watch<F>(&self, path: Option<&str>, observer: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner
            .notifier
            .register(path.map(KeyPath::parse), Sink::Callback(Arc::new(observer)))
    }

    /// Subscribe to every published state.
    pub fn watch_all<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.watch(None, observer)
    }

    /// Subscribe to changes at one key path.
    pub fn watch_path<F>(&self, path: &str, observer: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.watch(Some(path), observer)
    }

    /// Subscribe as an async stream. Same filtering as [`watch`](Self::watch).
    #[must_use]
    pub fn stream(&self, path: Option<&str>) -> WatchStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let subscription = self
            .inner
            .notifier
            .register(path.map(KeyPath::parse), Sink::Channel(tx));
        WatchStream::new(UnboundedReceiverStream::new(rx), subscription)
    }

    /// Number of active subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.notifier.len()
    }

    /// Number of handles sharing this store's state.
    #[must_use]
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.inner.id)
            .field("revision", &self.revision())
            .field("debug", &self.is_debug())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
