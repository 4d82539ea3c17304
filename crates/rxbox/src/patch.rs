//! JSON Patch (RFC 6902) descriptions of state mutations.

use json_patch::{diff, Patch, PatchError, PatchOperation};
use rxbox_core::State;
use serde::Serialize;
use serde_json::Value;

/// The change a mutation made, as a JSON Patch from the old state to the new.
///
/// Serializes as the bare RFC 6902 operation array.
///
/// # Example
///
/// ```rust
/// use rxbox::Store;
/// use serde_json::json;
///
/// let store = Store::new();
/// store.assign_state(&json!({"x": 1})).unwrap();
/// let patch = store.assign_state(&json!({"x": 2})).unwrap();
///
/// let json = serde_json::to_string(&patch).unwrap();
/// assert!(json.contains("replace"));
/// assert!(json.contains("/x"));
/// ```
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct StatePatch(Patch);

impl StatePatch {
    /// Diff two whole states.
    #[must_use]
    pub fn between(before: &State, after: &State) -> Self {
        Self(diff(
            &Value::Object(before.clone()),
            &Value::Object(after.clone()),
        ))
    }

    /// Diff two states that can only differ under `keys`.
    ///
    /// A shallow merge touches only the delta's top-level keys, so diffing
    /// those sub-trees yields the same operations as [`between`](Self::between)
    /// without copying the rest of the state.
    #[must_use]
    pub fn for_keys<'a>(
        before: &State,
        after: &State,
        keys: impl IntoIterator<Item = &'a String>,
    ) -> Self {
        let mut left = State::new();
        let mut right = State::new();
        for key in keys {
            if let Some(value) = before.get(key) {
                left.insert(key.clone(), value.clone());
            }
            if let Some(value) = after.get(key) {
                right.insert(key.clone(), value.clone());
            }
        }
        Self(diff(&Value::Object(left), &Value::Object(right)))
    }

    /// True when the mutation left the state unchanged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations().is_empty()
    }

    /// Number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations().len()
    }

    /// The RFC 6902 operations, in application order.
    #[must_use]
    pub fn operations(&self) -> &[PatchOperation] {
        &self.0 .0
    }

    /// Replay this change on `state`, turning the pre-mutation state into the
    /// post-mutation one.
    ///
    /// On error `state` is left as it was.
    ///
    /// # Errors
    ///
    /// Returns the [`PatchError`] of the first operation that does not apply,
    /// e.g. when `state` is not the state the patch was computed from.
    pub fn apply_to(&self, state: &mut State) -> Result<(), PatchError> {
        let mut doc = Value::Object(std::mem::take(state));
        let outcome = json_patch::patch(&mut doc, &self.0);
        if let Value::Object(map) = doc {
            *state = map;
        }
        outcome
    }
}
