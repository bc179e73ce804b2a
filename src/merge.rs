//! Recursive deep-merge of schema fragments.
//!
//! Rules, applied at every level:
//! - equal values merge to themselves;
//! - object ⊔ object merges key-wise over the union of keys (previous order first);
//! - array ⊔ array concatenates;
//! - a `null` on the right keeps the left value;
//! - anything else takes the right value.
//!
//! A key missing from one side is treated as `null` on that side, so keys only present on
//! the left survive.

use serde_json::Value;

use crate::fragment::Fragment;

pub fn merge(previous: Value, value: Value) -> Value {
    match (previous, value) {
        (previous, value) if previous == value => value,
        (Value::Object(previous), Value::Object(value)) => {
            Value::Object(merge_fragments(previous, value))
        }
        (Value::Array(mut previous), Value::Array(value)) => {
            previous.extend(value);
            Value::Array(previous)
        }
        (previous, Value::Null) => previous,
        (_, value) => value,
    }
}

pub fn merge_fragments(previous: Fragment, value: Fragment) -> Fragment {
    let mut out = Fragment::new();
    for (key, old) in previous {
        let new = value.get(&key).cloned().unwrap_or(Value::Null);
        out.insert(key, merge(old, new));
    }
    for (key, new) in value {
        if !out.contains_key(&key) {
            out.insert(key, merge(Value::Null, new));
        }
    }
    out
}

/// Merge `value` into the slot `key` of `fragment`, keeping the slot's position.
pub fn merge_into(fragment: &mut Fragment, key: &str, value: Value) {
    match fragment.get_mut(key) {
        Some(slot) => {
            let old = std::mem::take(slot);
            *slot = merge(old, value);
        }
        None => {
            fragment.insert(key.to_owned(), value);
        }
    }
}
