//! Label sets identifying metric instances within a family.
//!
//! A [`Labels`] value is an unordered collection of name/value pairs: two sets
//! are equal when they hold the same pairs, regardless of insertion order.
//! Iteration is ascending by label name, which gives collected samples a
//! reproducible label order.
//!
//! # Example
//!
//! ```rust
//! use registro::Labels;
//!
//! let a = Labels::new().with("method", "GET").with("path", "/api");
//! let b = Labels::new().with("path", "/api").with("method", "GET");
//! assert_eq!(a, b);
//!
//! let names: Vec<_> = a.iter().map(|(k, _)| k).collect();
//! assert_eq!(names, ["method", "path"]);
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// An order-insensitive set of label name/value pairs.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Labels {
    pairs: BTreeMap<String, String>,
}

impl Labels {
    /// Creates an empty label set.
    pub const fn new() -> Self {
        Self {
            pairs: BTreeMap::new(),
        }
    }

    /// Adds a label, returning `self` for method chaining.
    ///
    /// If the label already exists, its value is replaced.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds a label in place, returning the previous value if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.pairs.insert(name.into(), value.into())
    }

    /// Removes a label, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.pairs.remove(name)
    }

    /// Returns the value of a label, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.get(name).map(String::as_str)
    }

    /// Returns `true` if a label with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.pairs.contains_key(name)
    }

    /// Iterates over `(name, value)` pairs in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates over label names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pairs.keys().map(String::as_str)
    }

    /// Returns the number of labels.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if the set holds no labels.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Labels
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Labels
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl fmt::Debug for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.pairs.iter()).finish()
    }
}

impl fmt::Display for Labels {
    /// Formats the set as `{a="1",b="2"}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{name}={value:?}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a = Labels::new().with("c", "3").with("a", "1").with("b", "2");
        let b = Labels::from([("a", "1"), ("b", "2"), ("c", "3")]);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_different_values_are_not_equal() {
        let a = Labels::from([("a", "1")]);
        let b = Labels::from([("a", "2")]);
        assert_ne!(a, b);
        assert_ne!(a, Labels::new());
    }

    #[test]
    fn test_iteration_is_sorted_by_name() {
        let labels = Labels::new().with("zone", "z").with("app", "a").with("mid", "m");
        let pairs: Vec<_> = labels.iter().collect();
        assert_eq!(pairs, [("app", "a"), ("mid", "m"), ("zone", "z")]);
    }

    #[test]
    fn test_with_replaces_value() {
        let labels = Labels::new().with("key", "old").with("key", "new");
        assert_eq!(labels.get("key"), Some("new"));
        assert_eq!(labels.len(), 1);
    }

    #[test]
    fn test_insert_and_remove() {
        let mut labels = Labels::new();
        assert!(labels.is_empty());
        assert_eq!(labels.insert("k", "v"), None);
        assert_eq!(labels.insert("k", "w"), Some("v".to_string()));
        assert!(labels.contains("k"));
        assert_eq!(labels.remove("k"), Some("w".to_string()));
        assert!(labels.get("k").is_none());
    }

    #[test]
    fn test_display() {
        let labels = Labels::from([("b", "2"), ("a", "1")]);
        assert_eq!(labels.to_string(), r#"{a="1",b="2"}"#);
        assert_eq!(Labels::new().to_string(), "{}");
    }
}
