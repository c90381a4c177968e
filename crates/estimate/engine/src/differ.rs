//! Structural diff between record snapshots.
//!
//! Recurses through the serialized form of two records and reports
//! leaf-level differences keyed by dotted path. Depth is bounded; at the
//! bound a differing subtree is reported wholesale as a single change. A
//! null or missing node on either side is likewise a single change at
//! that path, never recursed into.

use serde_json::Value;

use estimate_types::{EstimateResult, StateDelta, WorkflowRecord};

/// Depth bound for the recursive walk. The record nests four levels at
/// most; anything deeper is a modelling accident this guard contains.
pub const DEFAULT_MAX_DIFF_DEPTH: usize = 8;

/// Diff two records, keyed by dotted path.
pub fn diff_records(
    before: &WorkflowRecord,
    after: &WorkflowRecord,
    max_depth: usize,
) -> EstimateResult<StateDelta> {
    let before = serde_json::to_value(before)?;
    let after = serde_json::to_value(after)?;
    Ok(diff_values(&before, &after, max_depth))
}

/// Diff two already-serialized snapshots.
pub fn diff_values(before: &Value, after: &Value, max_depth: usize) -> StateDelta {
    let mut delta = StateDelta::new();
    walk(&mut delta, "", before, after, max_depth);
    delta
}

fn walk(delta: &mut StateDelta, path: &str, before: &Value, after: &Value, depth_left: usize) {
    if before == after {
        return;
    }
    let label = if path.is_empty() { "(root)" } else { path };
    if depth_left == 0 {
        delta.insert(label, before.clone(), after.clone());
        return;
    }
    match (before, after) {
        (Value::Object(b), Value::Object(a)) => {
            for key in b.keys().chain(a.keys().filter(|k| !b.contains_key(*k))) {
                let child = join(path, key);
                walk(
                    delta,
                    &child,
                    b.get(key).unwrap_or(&Value::Null),
                    a.get(key).unwrap_or(&Value::Null),
                    depth_left - 1,
                );
            }
        }
        (Value::Array(b), Value::Array(a)) => {
            for index in 0..b.len().max(a.len()) {
                let child = join(path, &index.to_string());
                walk(
                    delta,
                    &child,
                    b.get(index).unwrap_or(&Value::Null),
                    a.get(index).unwrap_or(&Value::Null),
                    depth_left - 1,
                );
            }
        }
        // Scalars, and any null-vs-structure mismatch: one leaf change.
        _ => delta.insert(label, before.clone(), after.clone()),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}
