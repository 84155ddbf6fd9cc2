//! The argument object shared by every stage of one invocation.
//!
//! [`Arguments`] maps option names (including aliases) to JSON values and
//! keeps positional values under the reserved [`POSITIONAL_KEY`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key under which positional values are stored.
pub const POSITIONAL_KEY: &str = "_";

/// Parsed arguments for one invocation.
///
/// Insertion order is preserved so that debug output and serialized forms
/// follow the order in which options were seen or added.
///
/// # Example
///
/// ```
/// use argmill_core::Arguments;
/// use serde_json::json;
///
/// let mut args = Arguments::new();
/// args.set("mw", "mw");
/// args.push_positional(json!("build"));
///
/// assert_eq!(args.get_str("mw"), Some("mw"));
/// assert_eq!(args.positionals(), &[json!("build")]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments {
    values: IndexMap<String, Value>,
}

impl Arguments {
    /// Creates an argument object with an empty positional list.
    #[must_use]
    pub fn new() -> Self {
        let mut values = IndexMap::new();
        values.insert(POSITIONAL_KEY.to_string(), Value::Array(Vec::new()));
        Self { values }
    }

    /// Creates an empty patch with no positional list.
    ///
    /// Merging a patch leaves keys it does not mention untouched, including
    /// the positional values.
    #[must_use]
    pub fn patch() -> Self {
        Self {
            values: IndexMap::new(),
        }
    }

    /// Creates an argument object from a JSON object.
    ///
    /// Returns `None` when `value` is not an object. A missing positional
    /// list is added.
    #[must_use]
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => {
                let mut args = Self::new();
                for (key, value) in map {
                    args.values.insert(key, value);
                }
                Some(args)
            }
            _ => None,
        }
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the value under `key` if it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Returns the value under `key` if it is an integer.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(Value::as_i64)
    }

    /// Returns the value under `key` if it is a boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Stores `value` under `key`; a repeated key collects values into an array.
    pub fn append(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.values.get_mut(&key) {
            Some(Value::Array(items)) if key != POSITIONAL_KEY => items.push(value),
            Some(existing) => {
                let previous = existing.take();
                *existing = Value::Array(vec![previous, value]);
            }
            None => {
                self.values.insert(key, value);
            }
        }
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns the positional values.
    #[must_use]
    pub fn positionals(&self) -> &[Value] {
        match self.values.get(POSITIONAL_KEY) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Appends a positional value.
    pub fn push_positional(&mut self, value: Value) {
        let slot = self
            .values
            .entry(POSITIONAL_KEY.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match slot {
            Value::Array(items) => items.push(value),
            other => *other = Value::Array(vec![value]),
        }
    }

    /// Removes and returns the first positional value.
    pub fn shift_positional(&mut self) -> Option<Value> {
        match self.values.get_mut(POSITIONAL_KEY) {
            Some(Value::Array(items)) if !items.is_empty() => Some(items.remove(0)),
            _ => None,
        }
    }

    /// Copies every entry of `other` into `self`; keys in `other` win.
    pub fn merge(&mut self, other: Arguments) {
        for (key, value) in other.values {
            self.values.insert(key, value);
        }
    }

    /// Iterates over the option names, positional key included.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of entries, positional key included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Converts the arguments into a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl Default for Arguments {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects pairs into a patch; no positional list is added.
impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Arguments {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut args = Self::patch();
        for (key, value) in iter {
            args.set(key, value);
        }
        args
    }
}
