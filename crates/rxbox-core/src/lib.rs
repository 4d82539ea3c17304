//! Core value model for the RXBox state container.
//!
//! Everything in this crate is pure: key-path resolution, structural
//! equality, shallow merging and delta validation operate on borrowed
//! [`serde_json::Value`] trees and never touch shared state.
//!
//! ```rust
//! use rxbox_core::{equality, path::KeyPath};
//! use serde_json::json;
//!
//! let state = json!({"user": {"tags": ["a", "b"]}});
//! let path = KeyPath::parse("user.tags[1]");
//!
//! assert_eq!(path.resolve(&state), Some(&json!("b")));
//! assert!(equality::equals(&state, &json!({"user": {"tags": ["a", "b"]}})));
//! ```

pub mod equality;
pub mod error;
pub mod merge;
pub mod path;
pub mod types;
pub mod validate;

pub use error::{CoreError, CoreResult};
pub use path::KeyPath;

/// Re-export to ensure the same type is used
pub use serde_json::Value as JsonValue;

/// The root of a state tree. Always a map, never null.
pub type State = serde_json::Map<String, JsonValue>;
