//! Structural (deep) equality over state trees.
//!
//! Change notification hinges on this predicate: a false "equal" drops a
//! notification, a false "unequal" fires a spurious one.
//!
//! Rules:
//!
//! - scalars compare by kind and value; numbers compare numerically, so
//!   `1` equals `1.0`
//! - containers must be the same kind (map vs sequence)
//! - maps need the same key set and pairwise-equal values; a key holding
//!   `null` is not the same as a missing key
//! - sequences need the same length and pairwise-equal elements in order

use serde_json::{Map, Number, Value};
use std::ptr;

/// Deep structural equality between two values.
///
/// ```rust
/// use rxbox_core::equality::equals;
/// use serde_json::json;
///
/// assert!(equals(&json!({"a": [1, {"b": 2}]}), &json!({"a": [1, {"b": 2}]})));
/// assert!(!equals(&json!({"a": [1, {"b": 2}]}), &json!({"a": [1, {"b": 3}]})));
/// assert!(!equals(&json!({}), &json!({"a": null})));
/// ```
#[must_use]
pub fn equals(a: &Value, b: &Value) -> bool {
    if ptr::eq(a, b) {
        return true;
    }

    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| equals(x, y))
        }
        (Value::Object(x), Value::Object(y)) => maps_equal(x, y),
        _ => false,
    }
}

/// Equality where either side may be absent.
///
/// Absent equals absent and nothing else; in particular absent is not equal
/// to a present `null`.
#[must_use]
pub fn equals_opt(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => equals(a, b),
        _ => false,
    }
}

/// Deep equality between two state maps.
#[must_use]
pub fn maps_equal(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    if ptr::eq(a, b) {
        return true;
    }
    a.len() == b.len()
        && a
            .iter()
            .all(|(key, x)| b.get(key).is_some_and(|y| equals(x, y)))
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return x == y;
    }
    // Mixed integer/float, or integers on opposite sides of i64::MAX.
    if x.is_f64() || y.is_f64() {
        return match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        };
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn identical_reference_is_equal() {
        let v = json!({"a": [1, 2, 3]});
        assert!(equals(&v, &v));
    }

    #[test]
    fn scalars() {
        assert!(equals(&json!(null), &json!(null)));
        assert!(equals(&json!(true), &json!(true)));
        assert!(!equals(&json!(true), &json!(false)));
        assert!(equals(&json!("x"), &json!("x")));
        assert!(!equals(&json!("x"), &json!("y")));
        assert!(equals(&json!(3), &json!(3)));
        assert!(!equals(&json!(3), &json!(4)));
    }

    #[test]
    fn scalar_kinds_never_cross() {
        assert!(!equals(&json!(0), &json!(false)));
        assert!(!equals(&json!(null), &json!(false)));
        assert!(!equals(&json!(""), &json!(null)));
        assert!(!equals(&json!("1"), &json!(1)));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(equals(&json!(1), &json!(1.0)));
        assert!(equals(&json!(-2), &json!(-2.0)));
        assert!(!equals(&json!(1), &json!(1.5)));
        assert!(equals(&json!(0.25), &json!(0.25)));
        assert!(equals(&json!(u64::MAX), &json!(u64::MAX)));
        assert!(!equals(&json!(u64::MAX), &json!(-1)));
    }

    #[test]
    fn composite_vs_scalar() {
        assert!(!equals(&json!({}), &json!(null)));
        assert!(!equals(&json!([]), &json!(0)));
        assert!(!equals(&json!("a"), &json!(["a"])));
    }

    #[test]
    fn container_kinds_must_match() {
        assert!(!equals(&json!({}), &json!([])));
        assert!(!equals(&json!({"0": 1}), &json!([1])));
    }

    #[test]
    fn nested_structures() {
        assert!(equals(
            &json!({"a": [1, {"b": 2}]}),
            &json!({"a": [1, {"b": 2}]})
        ));
        assert!(!equals(
            &json!({"a": [1, {"b": 2}]}),
            &json!({"a": [1, {"b": 3}]})
        ));
        assert!(!equals(
            &json!({"a": {"b": {"c": [null]}}}),
            &json!({"a": {"b": {"c": []}}})
        ));
    }

    #[test]
    fn map_key_order_is_irrelevant() {
        assert!(equals(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1})));
    }

    #[test]
    fn null_valued_key_differs_from_missing_key_both_ways() {
        assert!(!equals(&json!({}), &json!({"a": null})));
        assert!(!equals(&json!({"a": null}), &json!({})));
        assert!(!equals(&json!({"a": null}), &json!({"b": null})));
        assert!(equals(&json!({"a": null}), &json!({"a": null})));
    }

    #[test]
    fn extra_key_on_either_side() {
        assert!(!equals(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!equals(&json!({"a": 1, "b": 2}), &json!({"a": 1})));
    }

    #[test]
    fn sequence_order_and_length_matter() {
        assert!(!equals(&json!([1, 2]), &json!([2, 1])));
        assert!(!equals(&json!([1, 2]), &json!([1, 2, 3])));
        assert!(!equals(&json!([null]), &json!([])));
        assert!(equals(&json!([]), &json!([])));
    }

    #[test]
    fn absent_handling() {
        assert!(equals_opt(None, None));
        assert!(!equals_opt(None, Some(&json!(null))));
        assert!(!equals_opt(Some(&json!(null)), None));
        assert!(equals_opt(Some(&json!({"x": 1})), Some(&json!({"x": 1.0}))));
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-z]{0,4}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-c]{1,2}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn reflexive_on_clones(v in arb_value()) {
            prop_assert!(equals(&v, &v.clone()));
        }

        #[test]
        fn symmetric(a in arb_value(), b in arb_value()) {
            prop_assert_eq!(equals(&a, &b), equals(&b, &a));
        }

        #[test]
        fn agrees_with_value_eq_without_floats(a in arb_value(), b in arb_value()) {
            prop_assert_eq!(equals(&a, &b), a == b);
        }
    }
}
