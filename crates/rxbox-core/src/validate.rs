//! Strict-mode checks for incoming deltas.
//!
//! A delta passes when every map key, at every depth, can be addressed by a
//! key path and the tree stays within a depth limit. Validation runs before
//! anything is merged.

use crate::error::{CoreError, CoreResult};
use crate::State;
use serde_json::Value;

/// Characters that carry meaning inside a key path.
pub const PATH_SYNTAX: [char; 3] = ['.', '[', ']'];

/// Validate a delta against strict-mode rules.
///
/// Top-level keys sit at depth 1; a value nested one map or sequence deeper
/// sits at depth 2, and so on.
///
/// # Errors
///
/// - [`CoreError::InvalidKey`] if a map key contains `.`, `[` or `]`
/// - [`CoreError::DepthExceeded`] if nesting goes past `max_depth`
///
/// ```rust
/// use rxbox_core::validate::validate_delta;
/// use serde_json::json;
///
/// let ok = json!({"user": {"name": "ana"}});
/// assert!(validate_delta(ok.as_object().unwrap(), 8).is_ok());
///
/// let bad = json!({"user.name": "ana"});
/// assert!(validate_delta(bad.as_object().unwrap(), 8).is_err());
/// ```
pub fn validate_delta(delta: &State, max_depth: usize) -> CoreResult<()> {
    let mut path = Vec::new();
    check_map(delta, 1, max_depth, &mut path)
}

fn check_map(
    map: &State,
    depth: usize,
    max_depth: usize,
    path: &mut Vec<String>,
) -> CoreResult<()> {
    for (key, value) in map {
        if key.contains(PATH_SYNTAX) {
            return Err(CoreError::InvalidKey {
                path: path.join("."),
                key: key.clone(),
            });
        }
        path.push(key.clone());
        check_value(value, depth, max_depth, path)?;
        path.pop();
    }
    Ok(())
}

fn check_value(
    value: &Value,
    depth: usize,
    max_depth: usize,
    path: &mut Vec<String>,
) -> CoreResult<()> {
    if depth > max_depth {
        return Err(CoreError::DepthExceeded {
            path: path.join("."),
            max: max_depth,
        });
    }
    match value {
        Value::Object(map) => check_map(map, depth + 1, max_depth, path),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                path.push(index.to_string());
                check_value(item, depth + 1, max_depth, path)?;
                path.pop();
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
