//! Merge algebra - combines two resolved values into one
//!
//! Rules apply in order, first match wins:
//!
//! | condition | result |
//! |-----------|--------|
//! | `source` falsy | `target` |
//! | `target` falsy | `source` |
//! | either is date-like | that value (`source` checked first) |
//! | both convert to non-zero numbers | numeric sum |
//! | both strings | space-joined |
//! | both arrays | concatenation |
//! | otherwise | deep merge into a fresh object, `target` wins on leaves |
//!
//! Numeric text that converts to zero (`"0"`, `""`) is not numeric here and
//! falls through to the later rules.

use crate::value::{is_date_like, is_truthy, number_value, to_number};
use serde_json::{Map, Value};

/// Combine `source` with `target`
///
/// # Examples
///
/// ```
/// use harvester_domain::merge;
/// use serde_json::json;
///
/// assert_eq!(merge(json!(null), json!(5)), json!(5));
/// assert_eq!(merge(json!("a"), json!("b")), json!("a b"));
/// assert_eq!(merge(json!([1]), json!([2])), json!([1, 2]));
/// assert_eq!(merge(json!(1), json!("1")), json!(2));
/// ```
pub fn merge(source: Value, target: Value) -> Value {
    if !is_truthy(&source) {
        return target;
    }
    if !is_truthy(&target) {
        return source;
    }

    if is_date_like(&source) {
        return source;
    }
    if is_date_like(&target) {
        return target;
    }

    if let (Some(a), Some(b)) = (to_number(&source), to_number(&target)) {
        if a != 0.0 && b != 0.0 {
            return number_value(a + b);
        }
    }

    match (source, target) {
        (Value::String(a), Value::String(b)) => Value::String(
            [a, b]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        ),
        (Value::Array(mut a), Value::Array(b)) => {
            a.extend(b);
            Value::Array(a)
        }
        (source, target) => {
            let mut dest = Map::new();
            merge_entries(&mut dest, &source);
            merge_entries(&mut dest, &target);
            Value::Object(dest)
        }
    }
}

/// Copy the keys of `src` into `dest`; array elements land under index keys
fn merge_entries(dest: &mut Map<String, Value>, src: &Value) {
    match src {
        Value::Object(map) => {
            for (key, value) in map {
                merge_slot(dest.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                merge_slot(dest.entry(index.to_string()).or_insert(Value::Null), value);
            }
        }
        // scalars carry no keys
        _ => {}
    }
}

fn merge_slot(slot: &mut Value, src: &Value) {
    match src {
        Value::Object(_) => {
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(dest) = slot {
                merge_entries(dest, src);
            }
        }
        Value::Array(items) => {
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            if let Value::Array(dest) = slot {
                for (index, value) in items.iter().enumerate() {
                    if index >= dest.len() {
                        dest.push(Value::Null);
                    }
                    merge_slot(&mut dest[index], value);
                }
            }
        }
        scalar => *slot = scalar.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_falsy_source_returns_target() {
        assert_eq!(merge(json!(null), json!(1)), json!(1));
        assert_eq!(merge(json!(0), json!(1)), json!(1));
        assert_eq!(merge(json!(""), json!("x")), json!("x"));
        assert_eq!(merge(json!(false), json!([1])), json!([1]));
    }

    #[test]
    fn test_falsy_target_returns_source() {
        assert_eq!(merge(json!(1), json!(null)), json!(1));
        assert_eq!(merge(json!(1), json!(0)), json!(1));
        assert_eq!(merge(json!({ "a": 1 }), json!(false)), json!({ "a": 1 }));
    }

    #[test]
    fn test_date_wins() {
        let now = json!("2024-05-06T07:08:09Z");
        assert_eq!(merge(now.clone(), json!("now")), now);
        assert_eq!(merge(json!("now"), now.clone()), now);
        assert_eq!(merge(json!(5), now.clone()), now);

        let earlier = json!("2020-01-01T00:00:00Z");
        assert_eq!(merge(earlier.clone(), now), earlier);
    }

    #[test]
    fn test_numeric_sum() {
        assert_eq!(merge(json!(1), json!(1)), json!(2));
        assert_eq!(merge(json!("1"), json!(1)), json!(2));
        assert_eq!(merge(json!(1), json!("1")), json!(2));
        assert_eq!(merge(json!(3), json!("4")), json!(7));
        assert_eq!(merge(json!(1.5), json!(" 2 ")), json!(3.5));
    }

    #[test]
    fn test_zero_text_is_not_numeric() {
        assert_eq!(merge(json!("0"), json!("5")), json!("0 5"));
        assert_eq!(merge(json!("12"), json!("0.0")), json!("12 0.0"));
    }

    #[test]
    fn test_string_concat() {
        assert_eq!(merge(json!("lorem"), json!("")), json!("lorem"));
        assert_eq!(merge(json!(""), json!("ipsum dolor")), json!("ipsum dolor"));
        assert_eq!(merge(json!("lorem"), json!("ipsum dolor")), json!("lorem ipsum dolor"));
    }

    #[test]
    fn test_array_concat() {
        let source = json!(["a", "b"]);
        let target = json!(["c"]);
        assert_eq!(merge(source.clone(), json!([])), source);
        assert_eq!(merge(json!([]), target.clone()), target);
        assert_eq!(merge(source, target), json!(["a", "b", "c"]));
    }

    #[test]
    fn test_deep_merge_fallback() {
        assert_eq!(
            merge(json!(["a", "b"]), json!({ "id": "x" })),
            json!({ "0": "a", "1": "b", "id": "x" })
        );
        assert_eq!(
            merge(json!({ "id": "x" }), json!(["c"])),
            json!({ "id": "x", "0": "c" })
        );
        assert_eq!(
            merge(
                json!({ "a": { "b": 1, "c": [1, 2] }, "keep": true }),
                json!({ "a": { "c": [3] }, "d": null })
            ),
            json!({ "a": { "b": 1, "c": [3, 2] }, "keep": true, "d": null })
        );
        assert_eq!(merge(json!(true), json!(5)), json!({}));
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i32>().prop_map(Value::from),
            "[a-z0-9 ]{0,8}".prop_map(Value::from),
        ]
    }

    fn value() -> impl Strategy<Value = Value> {
        scalar().prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-c]", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_merge_is_total(a in value(), b in value()) {
            let merged = merge(a.clone(), b.clone());
            if !is_truthy(&a) {
                prop_assert_eq!(merged, b);
            } else if !is_truthy(&b) {
                prop_assert_eq!(merged, a);
            }
        }

        #[test]
        fn prop_falsy_is_identity(v in value()) {
            prop_assert_eq!(merge(Value::Null, v.clone()), v.clone());
            if is_truthy(&v) {
                prop_assert_eq!(merge(v.clone(), Value::Null), v);
            }
        }

        #[test]
        fn prop_arrays_concatenate(
            a in prop::collection::vec(value(), 0..4),
            b in prop::collection::vec(value(), 0..4),
        ) {
            let merged = merge(Value::Array(a.clone()), Value::Array(b.clone()));
            let expected: Vec<Value> = a.into_iter().chain(b).collect();
            prop_assert_eq!(merged, Value::Array(expected));
        }

        #[test]
        fn prop_objects_keep_every_key(a in value(), b in value()) {
            if let (Value::Object(left), Value::Object(right)) = (&a, &b) {
                let merged = merge(a.clone(), b.clone());
                let merged = merged.as_object().unwrap();
                for key in left.keys().chain(right.keys()) {
                    prop_assert!(merged.contains_key(key));
                }
            }
        }
    }
}
