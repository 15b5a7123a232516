//! The value-polymorphic type shared by `SharedContext` content and
//! `Negotiation` proposals.
//!
//! Both the context tree and a negotiation proposal are maps of
//! `string -> value` where `value` can itself nest. Representing both with
//! the same tagged variant lets merge/diff/compromise logic live in one
//! place and dispatch on the tag, per the design note in the spec.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A scalar leaf value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Bool(bool),
    String(String),
}

/// A value in a context tree or negotiation proposal
///
/// `Tree` uses a `BTreeMap` rather than `HashMap` so that key order (and
/// therefore serialization and diff output) is deterministic, which the
/// negotiation resolution strategies and context diffing both rely on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    List(Vec<Value>),
    Set(Vec<Value>),
    Tree(BTreeMap<String, Value>),
}

impl Value {
    pub fn tree() -> Self {
        Value::Tree(BTreeMap::new())
    }

    pub fn number(n: f64) -> Self {
        Value::Scalar(Scalar::Number(n))
    }

    pub fn boolean(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::String(s.into()))
    }

    pub fn as_tree(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Tree(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_tree_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Tree(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Scalar(Scalar::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, Value::Tree(_))
    }

    /// Split a slash-separated path into segments. `/` (root) yields an
    /// empty segment list.
    pub fn split_path(path: &str) -> Vec<String> {
        path.trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }

    pub fn join_path(segments: &[String]) -> String {
        if segments.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", segments.join("/"))
        }
    }

    /// Read the value at `path`. Returns `None` (an absent marker, not an
    /// error) if any intermediate segment is missing or not a tree.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let segments = Self::split_path(path);
        let mut current = self;
        for segment in &segments {
            current = current.as_tree()?.get(segment)?;
        }
        Some(current)
    }

    /// Write `value` at `path`, creating intermediate empty trees as
    /// needed. Setting at `/` replaces the whole value.
    pub fn set_path(&mut self, path: &str, value: Value) {
        let segments = Self::split_path(path);
        if segments.is_empty() {
            *self = value;
            return;
        }
        let mut current = self;
        for segment in &segments[..segments.len() - 1] {
            if !matches!(current, Value::Tree(_)) {
                *current = Value::tree();
            }
            let tree = current.as_tree_mut().expect("just normalized to a tree");
            current = tree.entry(segment.clone()).or_insert_with(Value::tree);
        }
        if !matches!(current, Value::Tree(_)) {
            *current = Value::tree();
        }
        let tree = current.as_tree_mut().expect("just normalized to a tree");
        tree.insert(segments.last().unwrap().clone(), value);
    }

    /// Remove and return the value at `path`, if present.
    pub fn delete_path(&mut self, path: &str) -> Option<Value> {
        let segments = Self::split_path(path);
        if segments.is_empty() {
            let old = self.clone();
            *self = Value::tree();
            return Some(old);
        }
        let mut current = self;
        for segment in &segments[..segments.len() - 1] {
            current = current.as_tree_mut()?.get_mut(segment)?;
        }
        current.as_tree_mut()?.remove(segments.last().unwrap())
    }

    /// Flatten a tree into `(path, value)` pairs for every leaf (non-tree)
    /// value reachable from the root, used by diffing.
    pub fn flatten_leaves(&self) -> Vec<(String, Value)> {
        let mut out = Vec::new();
        self.flatten_into(&mut Vec::new(), &mut out);
        out
    }

    fn flatten_into(&self, prefix: &mut Vec<String>, out: &mut Vec<(String, Value)>) {
        match self {
            Value::Tree(t) => {
                if t.is_empty() && !prefix.is_empty() {
                    out.push((Self::join_path(prefix), self.clone()));
                }
                for (key, value) in t {
                    prefix.push(key.clone());
                    value.flatten_into(prefix, out);
                    prefix.pop();
                }
            }
            _ => {
                out.push((Self::join_path(prefix), self.clone()));
            }
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_path_creates_intermediate_trees() {
        let mut root = Value::tree();
        root.set_path("/a/b/c", Value::number(1.0));
        assert_eq!(root.get_path("/a/b/c"), Some(&Value::number(1.0)));
        assert!(root.get_path("/a/b").unwrap().is_tree());
    }

    #[test]
    fn get_path_missing_returns_none() {
        let root = Value::tree();
        assert_eq!(root.get_path("/missing"), None);
    }

    #[test]
    fn set_path_root_replaces_whole_value() {
        let mut root = Value::tree();
        root.set_path("/x", Value::number(1.0));
        root.set_path("/", Value::number(42.0));
        assert_eq!(root, Value::number(42.0));
    }

    #[test]
    fn delete_path_removes_leaf() {
        let mut root = Value::tree();
        root.set_path("/x", Value::number(1.0));
        let old = root.delete_path("/x");
        assert_eq!(old, Some(Value::number(1.0)));
        assert_eq!(root.get_path("/x"), None);
    }

    #[test]
    fn flatten_leaves_collects_all_paths() {
        let mut root = Value::tree();
        root.set_path("/x", Value::number(1.0));
        root.set_path("/y/z", Value::string("hello"));
        let mut leaves = root.flatten_leaves();
        leaves.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            leaves,
            vec![
                ("/x".to_string(), Value::number(1.0)),
                ("/y/z".to_string(), Value::string("hello")),
            ]
        );
    }
}
