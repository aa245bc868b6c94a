//! Structural walker for JSON payloads
//!
//! Only string leaves are ever scanned or rewritten. Keys, structure,
//! ordering, and non-string leaves (numbers, booleans, null) pass through
//! untouched. Each finding from inside a tree is annotated with a dotted
//! access path (`user.name`, `items[2].email`).
//!
//! The walk is split in two phases so the engine can process leaves
//! concurrently: collect all string leaves with their paths, then rebuild
//! an isomorphic tree from the processed leaf texts in the same traversal
//! order.

use crate::error::{Error, Result};
use serde_json::Value;

/// One string leaf of a JSON tree, with its access path from the root.
#[derive(Debug, Clone, PartialEq)]
pub struct StringLeaf {
    /// Dotted/bracketed path from the root
    pub path: String,
    /// Leaf contents
    pub text: String,
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn index_path(parent: &str, idx: usize) -> String {
    format!("{}[{}]", parent, idx)
}

/// Collect all string leaves in traversal order.
///
/// Depth is bounded to defend against hostile nesting; exceeding it fails
/// with `InputTooLarge` rather than risking unbounded recursion.
pub fn collect_string_leaves(value: &Value, max_depth: usize) -> Result<Vec<StringLeaf>> {
    let mut leaves = Vec::new();
    collect_inner(value, "", 0, max_depth, &mut leaves)?;
    Ok(leaves)
}

fn collect_inner(
    value: &Value,
    path: &str,
    depth: usize,
    max_depth: usize,
    leaves: &mut Vec<StringLeaf>,
) -> Result<()> {
    if depth > max_depth {
        return Err(Error::InputTooLarge(format!(
            "JSON nesting exceeds depth {}",
            max_depth
        )));
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                collect_inner(child, &child_path(path, key), depth + 1, max_depth, leaves)?;
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                collect_inner(child, &index_path(path, idx), depth + 1, max_depth, leaves)?;
            }
        }
        Value::String(s) => {
            leaves.push(StringLeaf {
                path: path.to_string(),
                text: s.clone(),
            });
        }
        // Numbers, booleans, null: never scanned
        _ => {}
    }

    Ok(())
}

/// Rebuild a tree isomorphic to `value`, replacing its string leaves with
/// `processed` in the traversal order of [`collect_string_leaves`].
pub fn rebuild_with_leaves(value: &Value, processed: &[String]) -> Value {
    let mut next = 0;
    let rebuilt = rebuild_inner(value, processed, &mut next);
    debug_assert_eq!(next, processed.len(), "leaf count mismatch");
    rebuilt
}

fn rebuild_inner(value: &Value, processed: &[String], next: &mut usize) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, child)| (key.clone(), rebuild_inner(child, processed, next)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|child| rebuild_inner(child, processed, next))
                .collect(),
        ),
        Value::String(_) => {
            let replacement = processed[*next].clone();
            *next += 1;
            Value::String(replacement)
        }
        other => other.clone(),
    }
}
