//! In-memory application state container with key-path change subscriptions.
//!
//! A [`Store`] owns a JSON-like state tree whose root is always a map. Callers
//! mutate it with a shallow merge ([`Store::assign_state`]) and observe it
//! through subscriptions that fire only when something they care about
//! actually changed.
//!
//! # Architecture
//!
//! 1. **[`Store`]** - sole owner and writer of the state; every mutation
//!    records the previous state in a [`HistoryBuffer`] and publishes the
//!    new state
//! 2. **Subscriptions** - [`Store::watch`] binds an observer to the whole
//!    state or to a key path like `"user.tags[0]"`; [`Store::stream`] does the
//!    same as an async [`futures::Stream`]
//! 3. **[`rxbox_core`]** - the pure pieces: key-path resolution, structural
//!    equality, shallow merge, delta validation
//!
//! # Change detection
//!
//! For a key-path subscription, each publication goes through two filters:
//!
//! - **relevance**: the path must resolve inside the delta that was merged,
//!   otherwise the mutation never touched it
//! - **value change**: the value at the path in the new state must differ
//!   structurally from the value in the previous state
//!
//! ```rust
//! use rxbox::Store;
//! use serde_json::{json, Value};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let store = Store::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&hits);
//! store.watch_path("foo", move |_: &Value| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! store.assign_state(&json!({"foo": 1})).unwrap();
//! store.assign_state(&json!({"foo": 1})).unwrap();
//! store.assign_state(&json!({"bar": 1})).unwrap();
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```
//!
//! # History
//!
//! With the debug flag off the store remembers only the previous state. With
//! it on (see [`Store::set_debug`]) every past state is kept, optionally
//! capped by [`StoreConfig::history_limit`].
//!
//! # Error Handling
//!
//! Reads and subscriptions never fail. Mutations that accept caller data
//! return [`StoreResult`]; every error is raised before the state changes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod global;
pub mod history;
pub mod notifier;
pub mod patch;
mod store;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use global::DebugView;
pub use history::HistoryBuffer;
pub use notifier::{Observer, Subscription, SubscriptionId, WatchStream};
pub use patch::StatePatch;
pub use store::Store;

// Re-export the entire rxbox-core crate for full access
pub use rxbox_core;

// Re-export commonly used core types for convenience
pub use rxbox_core::types::StoreId;
pub use rxbox_core::{CoreError, JsonValue, KeyPath, State};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use rxbox::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::StoreConfig;
    pub use crate::error::{StoreError, StoreResult};
    pub use crate::notifier::{Subscription, WatchStream};
    pub use crate::patch::StatePatch;
    pub use crate::store::Store;

    pub use rxbox_core::equality::equals;
    pub use rxbox_core::{JsonValue, KeyPath, State};
}
