//! Shallow merge of a delta into a state map.

use crate::error::{CoreError, CoreResult};
use crate::State;
use serde_json::Value;

/// Merge `delta` over `base`, top-level keys only.
///
/// Every key of `delta` overwrites (or adds to) `base`; nested values are
/// replaced wholesale, never merged recursively.
///
/// ```rust
/// use rxbox_core::merge::shallow_merge;
/// use serde_json::json;
///
/// let base = json!({"a": {"x": 1, "y": 2}, "b": 1});
/// let delta = json!({"a": {"x": 9}});
///
/// let merged = shallow_merge(base.as_object().unwrap(), delta.as_object().unwrap());
/// assert_eq!(serde_json::Value::Object(merged), json!({"a": {"x": 9}, "b": 1}));
/// ```
#[must_use]
pub fn shallow_merge(base: &State, delta: &State) -> State {
    let mut merged = base.clone();
    for (key, value) in delta {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Take a value as a delta, rejecting anything that is not a map.
///
/// # Errors
///
/// Returns [`CoreError::NotAnObject`] for scalars, sequences and `null`.
pub fn into_delta(value: Value) -> CoreResult<State> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::NotAnObject {
            kind: kind_of(&other),
        }),
    }
}

/// Short human-readable name of a value's kind.
#[must_use]
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
