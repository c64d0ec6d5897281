//! Shallow configuration maps with "defaults" merge semantics.
//!
//! Every write funnels through [`merge_defaults`]: keys supplied by the caller
//! win, keys only present in the base survive. Nested objects are never merged
//! recursively.

use serde_json::{Map, Value};

/// Merge `incoming` over `base`.
///
/// Keys present in `incoming` keep their value; keys missing from `incoming`
/// are filled in from `base`.
pub fn merge_defaults(mut incoming: Map<String, Value>, base: &Map<String, Value>) -> Map<String, Value> {
    for (key, value) in base {
        if !incoming.contains_key(key) {
            incoming.insert(key.clone(), value.clone());
        }
    }
    incoming
}

/// A flat key/value configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    values: Map<String, Value>,
}

impl Config {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self { values: Map::new() }
    }

    /// Build a configuration from `(key, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut config = Self::new();
        config.set_many(pairs);
        config
    }

    /// Return this configuration with gaps filled from `base`.
    pub fn with_defaults(self, base: &Config) -> Self {
        Self {
            values: merge_defaults(self.values, &base.values),
        }
    }

    /// Set a single key.
    pub fn set_one(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let mut incoming = Map::new();
        incoming.insert(key.into(), value.into());
        self.merge(incoming);
    }

    /// Set several keys at once.
    pub fn set_many<K, V, I>(&mut self, pairs: I)
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let incoming = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<Map<String, Value>>();
        self.merge(incoming);
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    fn merge(&mut self, incoming: Map<String, Value>) {
        let base = std::mem::take(&mut self.values);
        self.values = merge_defaults(incoming, &base);
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Look up a key, falling back to `default` when absent.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.values.get(key).cloned().unwrap_or_else(|| default.into())
    }

    /// Look up a key as a string slice.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the configuration is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Convert into a JSON object value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

impl From<Map<String, Value>> for Config {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Config {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_incoming_keys_win() {
        let base = Config::from_pairs([("baseUrl", json!("http://a")), ("foo", json!(1))]);
        let merged = Config::from_pairs([("foo", json!(2))]).with_defaults(&base);

        assert_eq!(merged.get("foo"), Some(&json!(2)));
        assert_eq!(merged.get("baseUrl"), Some(&json!("http://a")));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_set_one_overwrites_existing_key() {
        let mut config = Config::new();
        config.set_one("baseUrl", "http://a");
        config.set_one("baseUrl", "http://b");
        assert_eq!(config.get_str("baseUrl"), Some("http://b"));
    }

    #[test]
    fn test_set_many_keeps_untouched_keys() {
        let mut config = Config::from_pairs([("a", 1), ("b", 2)]);
        config.set_many([("b", 20), ("c", 30)]);

        assert_eq!(config.get("a"), Some(&json!(1)));
        assert_eq!(config.get("b"), Some(&json!(20)));
        assert_eq!(config.get("c"), Some(&json!(30)));
    }

    #[test]
    fn test_null_is_a_value_not_a_gap() {
        let base = Config::from_pairs([("baseUrl", json!("http://a"))]);
        let merged = Config::from_pairs([("baseUrl", Value::Null)]).with_defaults(&base);
        assert_eq!(merged.get("baseUrl"), Some(&Value::Null));
    }

    #[test]
    fn test_merge_is_shallow() {
        let base = Config::from_pairs([("nested", json!({"a": 1, "b": 2}))]);
        let merged = Config::from_pairs([("nested", json!({"a": 10}))]).with_defaults(&base);
        assert_eq!(merged.get("nested"), Some(&json!({"a": 10})));
    }

    #[test]
    fn test_removed_key_is_a_gap_again() {
        let mut config = Config::from_pairs([("baseUrl", json!("http://a")), ("uri", json!("/"))]);
        assert_eq!(config.remove("baseUrl"), Some(json!("http://a")));
        assert_eq!(config.remove("baseUrl"), None);

        let merged = config.with_defaults(&Config::from_pairs([("baseUrl", json!("http://b"))]));
        assert_eq!(merged.get_str("baseUrl"), Some("http://b"));
    }

    #[test]
    fn test_get_or_falls_back() {
        let config = Config::new();
        assert_eq!(config.get_or("missing", "fallback"), json!("fallback"));
        assert_eq!(config.get_or("missing", Value::Null), Value::Null);
    }
}
