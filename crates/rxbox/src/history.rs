//! Chronological log of past whole-state snapshots.
//!
//! The buffer has two modes, chosen per push by the store's debug flag:
//!
//! - **normal**: at most one entry, the state before the latest mutation
//! - **debug**: every pushed snapshot is kept, optionally capped by a limit
//!   that evicts the oldest entries first
//!
//! Entries are independent snapshots behind `Arc`, so handing one out never
//! exposes anything a caller could mutate.

use rxbox_core::State;
use std::collections::VecDeque;
use std::sync::Arc;

/// Bounded or unbounded history of state snapshots, oldest first.
#[derive(Debug, Clone, Default)]
pub struct HistoryBuffer {
    entries: VecDeque<Arc<State>>,
    limit: Option<usize>,
}

impl HistoryBuffer {
    /// Create an empty buffer with no debug-mode limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer whose debug-mode length is capped at `limit`.
    ///
    /// A limit of zero is treated as one.
    #[must_use]
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.map(|l| l.max(1)),
        }
    }

    /// Append a snapshot.
    ///
    /// In normal mode (`debug == false`) every earlier entry is evicted first.
    pub fn push(&mut self, snapshot: Arc<State>, debug: bool) {
        if debug {
            if let Some(limit) = self.limit {
                while self.entries.len() >= limit {
                    self.entries.pop_front();
                }
            }
        } else {
            self.entries.clear();
        }
        self.entries.push_back(snapshot);
    }

    /// The most recent snapshot, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&Arc<State>> {
        self.entries.back()
    }

    /// Snapshot at `index`, oldest first.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<State>> {
        self.entries.get(index)
    }

    /// All snapshots, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<State>> {
        self.entries.iter().cloned().collect()
    }

    /// Iterate over snapshots, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<State>> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Drop every snapshot.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of snapshots held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the buffer holds no snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
