//! Errors raised while turning caller data into a state delta.
//!
//! Path resolution and equality never fail; the only fallible core
//! operations are the ones that accept a delta from outside.

use thiserror::Error;

/// Rejections produced by delta conversion and strict-mode validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    /// The delta is not a map, so it has no top-level keys to merge.
    #[error("delta must be an object, got {kind}")]
    NotAnObject {
        /// Kind of value that was supplied instead.
        kind: &'static str,
    },

    /// A map key contains key-path syntax and could never be watched.
    #[error("key '{key}' at '{path}' contains key-path syntax ('.', '[' or ']')")]
    InvalidKey {
        /// Key path of the map holding the key.
        path: String,
        /// The offending key.
        key: String,
    },

    /// The delta nests deeper than the configured limit.
    #[error("delta nesting exceeds max depth {max} at '{path}'")]
    DepthExceeded {
        /// Key path where the limit was crossed.
        path: String,
        /// The configured limit.
        max: usize,
    },
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
