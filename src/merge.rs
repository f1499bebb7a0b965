//! Deep merge over `serde_json::Value`.
//!
//! Aggregation relies on recursive later-wins merging. Arrays are treated as
//! indexed containers: merging `[a, b]` with `[c]` yields `[c, b]`, never a
//! concatenation.

use serde_json::map::Entry;
use serde_json::{Map, Value};

/// Merge `source` into `target`, recursively.
///
/// Objects merge key by key. Arrays merge index by index: the source
/// overwrites the shared prefix and the target keeps its tail. Every other
/// combination replaces the target with a copy of the source.
pub fn merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.entry(key.clone()) {
                    Entry::Occupied(mut slot) => merge(slot.get_mut(), value),
                    Entry::Vacant(slot) => {
                        slot.insert(value.clone());
                    }
                }
            }
        }
        (Value::Array(target), Value::Array(source)) => {
            for (i, value) in source.iter().enumerate() {
                if i < target.len() {
                    merge(&mut target[i], value);
                } else {
                    target.push(value.clone());
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

/// Merge a sequence of values into a fresh object, later values winning.
pub fn merge_all<'a, I>(values: I) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut result = Value::Object(Map::new());
    for value in values {
        merge(&mut result, value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn later_value_wins_on_scalars() {
        let mut target = json!({"a": 1, "b": 2});
        merge(&mut target, &json!({"b": 3}));
        assert_eq!(target, json!({"a": 1, "b": 3}));
    }

    #[test]
    fn objects_merge_recursively() {
        let mut target = json!({"outer": {"keep": true, "swap": 1}});
        merge(&mut target, &json!({"outer": {"swap": 2, "add": "x"}}));
        assert_eq!(
            target,
            json!({"outer": {"keep": true, "swap": 2, "add": "x"}})
        );
    }

    #[test]
    fn arrays_merge_index_wise() {
        let mut target = json!(["a", "b"]);
        merge(&mut target, &json!(["c"]));
        assert_eq!(target, json!(["c", "b"]));
    }

    #[test]
    fn longer_source_array_extends_target() {
        let mut target = json!(["a"]);
        merge(&mut target, &json!(["b", "c"]));
        assert_eq!(target, json!(["b", "c"]));
    }

    #[test]
    fn nested_array_elements_merge() {
        let mut target = json!({"list": [{"a": 1}, {"b": 2}]});
        merge(&mut target, &json!({"list": [{"a": 9}]}));
        assert_eq!(target, json!({"list": [{"a": 9}, {"b": 2}]}));
    }

    #[test]
    fn mismatched_shapes_are_replaced() {
        let mut target = json!({"slot": {"was": "object"}});
        merge(&mut target, &json!({"slot": [1, 2]}));
        assert_eq!(target, json!({"slot": [1, 2]}));

        let mut target = json!({"slot": 1});
        merge(&mut target, &json!({"slot": null}));
        assert_eq!(target, json!({"slot": null}));
    }

    #[test]
    fn merge_all_folds_left_to_right() {
        let a = json!({"x": 1});
        let b = json!({"x": 2, "y": 1});
        let c = json!({"y": 3});
        assert_eq!(merge_all([&a, &b, &c]), json!({"x": 2, "y": 3}));
    }
}
