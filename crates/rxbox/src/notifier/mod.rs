//! Subscription registry and ordered delivery of state publications.
//!
//! Every mutation that changes the state produces one [`Publication`]. The
//! store queues it while still holding its write lock, so the queue order is
//! the mutation order, then calls [`Notifier::flush`] after releasing the
//! lock. Exactly one caller delivers at a time; a mutation issued from inside
//! an observer (or from another thread mid-delivery) is queued and delivered
//! by the caller already flushing, after the current publication completes.
//!
//! Each publication is delivered to a snapshot of the registry taken before
//! the first observer runs. Observers removed mid-publication are skipped, so
//! unsubscribing from inside a callback is safe. A panicking observer is
//! isolated: the remaining subscribers still receive the publication, and the
//! panic is resumed on the delivering caller once the queue is drained.

mod stream;
mod watcher;

pub use stream::WatchStream;
pub use watcher::Observer;

pub(crate) use watcher::{Selection, Sink, Watcher};

use parking_lot::Mutex;
use rxbox_core::types::StoreId;
use rxbox_core::{KeyPath, State};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use tracing::{debug, trace, warn};

static REMOVED: Value = Value::Null;

/// What a mutation changed, for relevance filtering.
#[derive(Debug, Clone)]
pub(crate) enum ChangeSet {
    /// A merge; carries the delta that was merged.
    Assigned(Arc<State>),
    /// The state was reset to an empty map.
    Cleared,
}

/// One published state transition.
#[derive(Debug, Clone)]
pub(crate) struct Publication {
    pub(crate) revision: u64,
    /// The new current state.
    pub(crate) state: Arc<State>,
    /// The state before the mutation; the snapshot just pushed to history.
    pub(crate) previous: Arc<State>,
    pub(crate) changes: ChangeSet,
}

/// Identifies a subscription within one store, in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// The raw sequence number.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

pub(crate) struct Notifier {
    store_id: StoreId,
    watchers: Mutex<BTreeMap<SubscriptionId, Arc<Watcher>>>,
    next_id: AtomicU64,
    queue: Mutex<VecDeque<Publication>>,
    delivering: AtomicBool,
}

impl Notifier {
    pub(crate) fn new(store_id: StoreId) -> Self {
        Self {
            store_id,
            watchers: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            queue: Mutex::new(VecDeque::new()),
            delivering: AtomicBool::new(false),
        }
    }

    pub(crate) fn register(self: &Arc<Self>, path: Option<KeyPath>, sink: Sink) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(
            store_id = %self.store_id,
            subscription = %id,
            path = path.as_ref().map_or("*", KeyPath::as_str),
            "subscribed"
        );
        self.watchers
            .lock()
            .insert(id, Arc::new(Watcher { path, sink }));
        Subscription {
            id,
            notifier: Arc::downgrade(self),
        }
    }

    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let removed = self.watchers.lock().remove(&id).is_some();
        if removed {
            debug!(store_id = %self.store_id, subscription = %id, "unsubscribed");
        }
        removed
    }

    pub(crate) fn contains(&self, id: SubscriptionId) -> bool {
        self.watchers.lock().contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.watchers.lock().len()
    }

    /// Queue a publication. Callers hold the store's write lock.
    pub(crate) fn enqueue(&self, publication: Publication) {
        self.queue.lock().push_back(publication);
    }

    /// Deliver queued publications in order, unless another caller already is.
    ///
    /// A panicking observer does not stop delivery: every queued publication
    /// still reaches every other subscriber, then the first panic is resumed.
    pub(crate) fn flush(&self) {
        let mut panicked = None;
        loop {
            if self
                .delivering
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                break;
            }

            {
                let _delivering = DeliveringGuard(&self.delivering);
                loop {
                    let next = self.queue.lock().pop_front();
                    let Some(publication) = next else { break };
                    if let Err(payload) = self.deliver(&publication) {
                        if panicked.is_none() {
                            panicked = Some(payload);
                        }
                    }
                }
            }

            // A publication queued between the last pop and the flag reset
            // would otherwise wait for the next mutation.
            let pending = !self.queue.lock().is_empty();
            if !pending {
                break;
            }
        }

        if let Some(payload) = panicked {
            panic::resume_unwind(payload);
        }
    }

    fn deliver(&self, publication: &Publication) -> thread::Result<()> {
        let watchers: Vec<(SubscriptionId, Arc<Watcher>)> = self
            .watchers
            .lock()
            .iter()
            .map(|(id, watcher)| (*id, Arc::clone(watcher)))
            .collect();

        let mut whole: Option<Value> = None;
        let mut closed = Vec::new();
        let mut panicked = None;

        for (id, watcher) in watchers {
            if !self.contains(id) {
                continue;
            }

            let selection = watcher.select(publication);
            if matches!(selection, Selection::Irrelevant | Selection::Unchanged) {
                trace!(
                    store_id = %self.store_id,
                    revision = publication.revision,
                    subscription = %id,
                    ?selection,
                    "skipped"
                );
                continue;
            }

            let value: &Value = match selection {
                Selection::Whole => {
                    whole.get_or_insert_with(|| Value::Object(State::clone(&publication.state)))
                }
                Selection::Value(value) => value,
                Selection::Removed | Selection::Irrelevant | Selection::Unchanged => &REMOVED,
            };

            trace!(
                store_id = %self.store_id,
                revision = publication.revision,
                subscription = %id,
                "emit"
            );
            match &watcher.sink {
                Sink::Callback(observer) => {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| observer(value)));
                    if let Err(payload) = outcome {
                        warn!(
                            store_id = %self.store_id,
                            revision = publication.revision,
                            subscription = %id,
                            "observer panicked"
                        );
                        if panicked.is_none() {
                            panicked = Some(payload);
                        }
                    }
                }
                Sink::Channel(tx) => {
                    if tx.send(value.clone()).is_err() {
                        closed.push(id);
                    }
                }
            }
        }

        for id in closed {
            self.remove(id);
        }
        panicked.map_or(Ok(()), Err)
    }
}

struct DeliveringGuard<'a>(&'a AtomicBool);

impl Drop for DeliveringGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Handle to an active subscription.
///
/// Dropping the handle does not unsubscribe; call
/// [`unsubscribe`](Self::unsubscribe). The handle only weakly references the
/// store, so it never keeps the store alive and becomes inert once the store
/// is gone.
#[derive(Clone)]
pub struct Subscription {
    id: SubscriptionId,
    notifier: Weak<Notifier>,
}

impl Subscription {
    /// This subscription's id.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Stop future emissions to this observer.
    ///
    /// Returns `true` if the subscription was active. Safe to call more than
    /// once, and from inside the observer itself.
    pub fn unsubscribe(&self) -> bool {
        self.notifier
            .upgrade()
            .is_some_and(|notifier| notifier.remove(self.id))
    }

    /// Check whether the subscription still receives emissions.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.notifier
            .upgrade()
            .is_some_and(|notifier| notifier.contains(self.id))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
