//! Structural-sharing maximizer.
//!
//! [`rebase_value`] takes an old tree and a new tree and returns a tree equal
//! to the new one that reuses the old tree's nodes wherever they are equal.
//! Neither input is modified: containers with substituted children are rebuilt.

use serde_json::Value as Json;

use crate::value::{ArrayContent, Content, ObjectContent, Value, ValueType};

/// Returns a value equal to `new` that shares as many nodes with `old` as
/// possible.
///
/// - Values of different types are not rebased.
/// - Object fields are rebased key by key; keys only in `old` are ignored.
/// - Arrays are rebased element-wise only when both have the same length.
/// - Scalars and strings are replaced by `old` when their JSON forms are equal.
///   Numbers compare by numeric value, so `1` and `1.0` are equal.
///
/// A container whose children all end up shared with `old` is replaced by
/// `old` itself.
pub fn rebase_value<O: Clone>(old: &Value<O>, new: &Value<O>) -> Value<O> {
    if Value::ptr_eq(old, new) {
        return old.clone();
    }
    let ty = old.value_type();
    if ty != new.value_type() {
        return new.clone();
    }

    match ty {
        ValueType::Object => rebase_object(old, new),
        ValueType::Array => rebase_array(old, new),
        ValueType::Number => {
            if same_number(old.to_json(), new.to_json()) {
                old.clone()
            } else {
                new.clone()
            }
        }
        ValueType::String | ValueType::Boolean | ValueType::Null => {
            if old.to_json() == new.to_json() {
                old.clone()
            } else {
                new.clone()
            }
        }
    }
}

fn same_number(a: &Json, b: &Json) -> bool {
    match (a, b) {
        (Json::Number(x), Json::Number(y)) => {
            x == y || ((x.is_f64() || y.is_f64()) && x.as_f64() == y.as_f64())
        }
        _ => false,
    }
}

fn rebase_object<O: Clone>(old: &Value<O>, new: &Value<O>) -> Value<O> {
    let (Ok(old_obj), Ok(new_obj)) = (old.as_object(), new.as_object()) else {
        return new.clone();
    };

    let mut changed = false;
    let mut all_old = old_obj.len() == new_obj.len();
    let mut fields = ObjectContent::new();
    for (key, new_val) in new_obj.iter() {
        let val = match old_obj.get(key) {
            Some(old_val) => {
                let val = rebase_value(old_val, new_val);
                all_old &= Value::ptr_eq(&val, old_val);
                val
            }
            None => {
                all_old = false;
                new_val.clone()
            }
        };
        changed |= !Value::ptr_eq(&val, new_val);
        fields.insert(key.clone(), val);
    }

    if all_old {
        old.clone()
    } else if !changed {
        new.clone()
    } else {
        Value::from_content(Content::Object(fields), new.origin().clone())
    }
}

fn rebase_array<O: Clone>(old: &Value<O>, new: &Value<O>) -> Value<O> {
    let (Ok(old_arr), Ok(new_arr)) = (old.as_array(), new.as_array()) else {
        return new.clone();
    };
    if old_arr.len() != new_arr.len() {
        return new.clone();
    }

    let mut changed = false;
    let mut all_old = true;
    let elements: ArrayContent<O> = old_arr
        .iter()
        .zip(new_arr.iter())
        .map(|(old_val, new_val)| {
            let val = rebase_value(old_val, new_val);
            all_old &= Value::ptr_eq(&val, old_val);
            changed |= !Value::ptr_eq(&val, new_val);
            val
        })
        .collect();

    if all_old {
        old.clone()
    } else if !changed {
        new.clone()
    } else {
        Value::from_content(Content::Array(elements), new.origin().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field<O: Clone>(value: &Value<O>, key: &str) -> Value<O> {
        value.as_object().unwrap().get(key).unwrap().clone()
    }

    #[test]
    fn equal_trees_collapse_to_old() {
        let old = Value::new(json!({"a": [1, {"b": "x"}], "c": null}), "old");
        let new = Value::new(json!({"a": [1, {"b": "x"}], "c": null}), "new");
        let out = rebase_value(&old, &new);
        assert!(Value::ptr_eq(&out, &old));
    }

    #[test]
    fn unchanged_fields_alias_old() {
        let old = Value::new(json!({"same": {"deep": [1, 2]}, "diff": 1, "gone": true}), "old");
        let new = Value::new(json!({"same": {"deep": [1, 2]}, "diff": 2, "added": "x"}), "new");
        let out = rebase_value(&old, &new);

        assert_eq!(out.to_json(), new.to_json());
        assert!(Value::ptr_eq(&field(&out, "same"), &field(&old, "same")));
        assert!(Value::ptr_eq(&field(&out, "diff"), &field(&new, "diff")));
        assert!(Value::ptr_eq(&field(&out, "added"), &field(&new, "added")));
        assert_eq!(*out.origin(), "new");
        // The new tree itself is left untouched.
        assert!(!Value::ptr_eq(&field(&new, "same"), &field(&old, "same")));
    }

    #[test]
    fn nothing_shared_returns_new() {
        let old = Value::new(json!({"a": 1}), ());
        let new = Value::new(json!({"a": 2, "b": 3}), ());
        assert!(Value::ptr_eq(&rebase_value(&old, &new), &new));
    }

    #[test]
    fn arrays_need_equal_length() {
        let old = Value::new(json!([{"k": 1}, 2]), ());
        let new = Value::new(json!([{"k": 1}, 2, 3]), ());
        let out = rebase_value(&old, &new);
        assert!(Value::ptr_eq(&out, &new));

        let new = Value::new(json!([{"k": 1}, 5]), ());
        let out = rebase_value(&old, &new);
        let (o, n, r) = (old.as_array().unwrap(), new.as_array().unwrap(), out.as_array().unwrap());
        assert!(Value::ptr_eq(r.get(0).unwrap(), o.get(0).unwrap()));
        assert!(Value::ptr_eq(r.get(1).unwrap(), n.get(1).unwrap()));
        assert_eq!(out.to_json(), &json!([{"k": 1}, 5]));
    }

    #[test]
    fn type_changes_keep_new() {
        let old = Value::new(json!("1"), ());
        let new = Value::new(json!(1), ());
        assert!(Value::ptr_eq(&rebase_value(&old, &new), &new));
    }

    #[test]
    fn numbers_compare_by_numeric_value() {
        let old = Value::new(json!({"n": 1, "m": 2.5}), ());
        let new = Value::new(json!({"n": 1.0, "m": 2.5}), ());
        assert!(Value::ptr_eq(&rebase_value(&old, &new), &old));

        let old = Value::new(json!(1), ());
        let new = Value::new(json!(1.5), ());
        assert!(Value::ptr_eq(&rebase_value(&old, &new), &new));

        let old = Value::new(json!(u64::MAX), ());
        let new = Value::new(json!(u64::MAX - 1), ());
        assert!(Value::ptr_eq(&rebase_value(&old, &new), &new));
    }

    #[test]
    fn scalars_compare_by_value() {
        let old = Value::new(json!("text"), ());
        let new = Value::new(json!("text"), ());
        assert!(Value::ptr_eq(&rebase_value(&old, &new), &old));
        let new = Value::new(json!(false), ());
        let old = Value::new(json!(true), ());
        assert!(Value::ptr_eq(&rebase_value(&old, &new), &new));
    }
}
