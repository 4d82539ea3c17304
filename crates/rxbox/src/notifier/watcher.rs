//! Per-subscription emission decisions.

use super::{ChangeSet, Publication};
use rxbox_core::equality::equals_opt;
use rxbox_core::KeyPath;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Observer callback type.
pub type Observer = Arc<dyn Fn(&Value) + Send + Sync>;

/// Where a subscription's emissions go.
pub(crate) enum Sink {
    Callback(Observer),
    Channel(UnboundedSender<Value>),
}

/// A registered subscription: an optional key path plus its sink.
pub(crate) struct Watcher {
    pub(crate) path: Option<KeyPath>,
    pub(crate) sink: Sink,
}

/// Outcome of evaluating one publication for one watcher.
#[derive(Debug, PartialEq)]
pub(crate) enum Selection<'a> {
    /// The change set never touched the watched path.
    Irrelevant,
    /// The path was touched but its value is structurally unchanged.
    Unchanged,
    /// Emit the whole new state.
    Whole,
    /// Emit the new value at the watched path.
    Value(&'a Value),
    /// The watched value disappeared.
    Removed,
}

impl Watcher {
    pub(crate) fn select<'a>(&self, publication: &'a Publication) -> Selection<'a> {
        match &self.path {
            None => Selection::Whole,
            Some(path) => select_path(path, publication),
        }
    }
}

pub(crate) fn select_path<'a>(path: &KeyPath, publication: &'a Publication) -> Selection<'a> {
    let relevant = match &publication.changes {
        ChangeSet::Assigned(delta) => path.resolve_in(delta).is_some(),
        ChangeSet::Cleared => path.resolve_in(&publication.previous).is_some(),
    };
    if !relevant {
        return Selection::Irrelevant;
    }

    let new = path.resolve_in(&publication.state);
    let old = path.resolve_in(&publication.previous);
    if equals_opt(old, new) {
        return Selection::Unchanged;
    }

    match new {
        Some(value) => Selection::Value(value),
        None => Selection::Removed,
    }
}
