//! Leaf-level structural diff between two record snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One leaf that changed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: Value,
    pub after: Value,
}

/// Changes keyed by dotted path (array elements by index, e.g.
/// `photos.items.0.label`). Ordered, so rendering and tests are
/// deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateDelta(BTreeMap<String, FieldChange>);

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, before: Value, after: Value) {
        self.0.insert(path.into(), FieldChange { before, after });
    }

    pub fn get(&self, path: &str) -> Option<&FieldChange> {
        self.0.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldChange)> {
        self.0.iter().map(|(path, change)| (path.as_str(), change))
    }
}

impl std::fmt::Display for StateDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (path, change) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}: {} -> {}", path, change.before, change.after)?;
            first = false;
        }
        Ok(())
    }
}
