//! The state bag: a mutable mapping from string keys to arbitrary JSON values
//! that flows through a graph run.
//!
//! Every node reads a projection of the bag (its declared `input_fields`),
//! produces a partial update, and the runtime merges that update back. See
//! [`adapter`] for the input-projection / output-merge contract and
//! [`reserved`] for the keys the runtime itself writes.

pub mod adapter;
pub mod reserved;

use serde_json::Value;
use std::collections::HashMap;

/// The shared mutable state flowing through a graph run.
///
/// A thin wrapper over `HashMap<String, Value>` so call sites read like the
/// spec's "state bag" rather than a bare map, while still being `Clone` and
/// cheaply mergeable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateBag(HashMap<String, Value>);

impl StateBag {
    /// Creates an empty state bag.
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Builds a state bag from an initial set of key/value pairs.
    pub fn from_map(map: HashMap<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &HashMap<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> HashMap<String, Value> {
        self.0
    }

    /// Merges `update` into `self`. Every key in `update` overwrites the
    /// corresponding key in `self`; every key in `self` not present in
    /// `update` is preserved (invariant 3, spec.md §8).
    pub fn merge(&mut self, update: StateBag) {
        for (k, v) in update.0 {
            self.0.insert(k, v);
        }
    }

    /// Reads a boolean reserved key, treating absence or a non-boolean value
    /// as `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(Value::Bool(true)))
    }
}

impl From<HashMap<String, Value>> for StateBag {
    fn from(map: HashMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for StateBag {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overwrites_update_keys_and_preserves_others() {
        let mut s = StateBag::new();
        s.insert("msg", json!("hi"));
        s.insert("kept", json!(1));

        let mut update = StateBag::new();
        update.insert("msg", json!("bye"));

        s.merge(update);

        assert_eq!(s.get("msg"), Some(&json!("bye")));
        assert_eq!(s.get("kept"), Some(&json!(1)));
    }

    #[test]
    fn get_bool_defaults_false_when_absent_or_wrong_type() {
        let mut s = StateBag::new();
        assert!(!s.get_bool("last_action_success"));
        s.insert("last_action_success", json!("true"));
        assert!(!s.get_bool("last_action_success"));
        s.insert("last_action_success", json!(true));
        assert!(s.get_bool("last_action_success"));
    }
}
