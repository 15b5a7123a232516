//! Recursive merge algorithm used by `MergeContexts`
//!
//! Both sides of a merge are `Value` trees. When both sides hold a subtree
//! at the same key, the merge recurses; otherwise the configured
//! resolution decides which leaf wins.

use accord_core::Value;

/// How conflicting (non-tree) values are resolved when both target and
/// source define the same leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeResolution {
    /// Keep the source's value.
    Source,
    /// Keep the target's value.
    Target,
    /// Treat the merge as "later" than the target: take the source, same
    /// as `Source`. Kept as a distinct variant because callers name it
    /// explicitly and the spec documents it as its own resolution mode.
    Latest,
}

impl MergeResolution {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "source" => Some(MergeResolution::Source),
            "target" => Some(MergeResolution::Target),
            "latest" => Some(MergeResolution::Latest),
            _ => None,
        }
    }
}

/// Merge `source` into `target`, recursing into shared subtrees and
/// applying `resolution` at every leaf conflict.
pub fn merge_values(target: &Value, source: &Value, resolution: MergeResolution) -> Value {
    match (target, source) {
        (Value::Tree(target_tree), Value::Tree(source_tree)) => {
            let mut merged = target_tree.clone();
            for (key, source_value) in source_tree {
                match merged.get(key) {
                    Some(target_value) => {
                        let resolved = merge_values(target_value, source_value, resolution);
                        merged.insert(key.clone(), resolved);
                    }
                    None => {
                        merged.insert(key.clone(), source_value.clone());
                    }
                }
            }
            Value::Tree(merged)
        }
        _ => match resolution {
            MergeResolution::Target => target.clone(),
            MergeResolution::Source | MergeResolution::Latest => source.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn tree(pairs: &[(&str, Value)]) -> Value {
        let mut map = BTreeMap::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.clone());
        }
        Value::Tree(map)
    }

    #[test]
    fn recurses_into_shared_subtrees() {
        let target = tree(&[("a", tree(&[("x", Value::number(1.0))]))]);
        let source = tree(&[("a", tree(&[("y", Value::number(2.0))]))]);
        let merged = merge_values(&target, &source, MergeResolution::Source);
        let a = merged.get_path("/a").unwrap();
        assert_eq!(a.get_path("/x").cloned(), Some(Value::number(1.0)).map(|v| v));
        assert_eq!(merged.get_path("/a/x"), Some(&Value::number(1.0)));
        assert_eq!(merged.get_path("/a/y"), Some(&Value::number(2.0)));
    }

    #[test]
    fn leaf_conflict_uses_resolution() {
        let target = tree(&[("x", Value::number(1.0))]);
        let source = tree(&[("x", Value::number(2.0))]);
        assert_eq!(
            merge_values(&target, &source, MergeResolution::Source).get_path("/x"),
            Some(&Value::number(2.0))
        );
        assert_eq!(
            merge_values(&target, &source, MergeResolution::Target).get_path("/x"),
            Some(&Value::number(1.0))
        );
        assert_eq!(
            merge_values(&target, &source, MergeResolution::Latest).get_path("/x"),
            Some(&Value::number(2.0))
        );
    }

    #[test]
    fn merge_is_idempotent_with_source_resolution() {
        let target = tree(&[("x", Value::number(1.0))]);
        let source = tree(&[("x", Value::number(2.0)), ("y", Value::string("hi"))]);
        let once = merge_values(&target, &source, MergeResolution::Source);
        let twice = merge_values(&once, &source, MergeResolution::Source);
        assert_eq!(once, twice);
    }
}
