//! Bounded, append-only journals: the human-auditable event log and the
//! simulated API trace.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use estimate_types::{ActorKind, StateDelta};

/// Default capacity for both journals.
pub const DEFAULT_LOG_CAPACITY: usize = 100;

// ── Ring ────────────────────────────────────────────────────────────────

/// Fixed-capacity append-only ring. When full, the oldest entry is
/// evicted first; both append and eviction are O(1).
#[derive(Clone, Debug, Serialize)]
pub struct BoundedLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Default for BoundedLog<T> {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

// ── Entries ─────────────────────────────────────────────────────────────

/// One applied action in the event log: who did what, and what changed.
#[derive(Clone, Debug, Serialize)]
pub struct EventLogEntry {
    pub timestamp: DateTime<Utc>,
    pub actor: ActorKind,
    pub action_label: String,
    pub delta: StateDelta,
    pub audit_id: Uuid,
    pub details: String,
}

/// HTTP verb of a simulated backend call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApiMethod {
    Post,
    Patch,
    Delete,
}

impl std::fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        write!(f, "{name}")
    }
}

/// What the equivalent backend call would have looked like. This is the
/// seam where a real HTTP client would slot in without touching engine
/// logic.
#[derive(Clone, Debug, Serialize)]
pub struct ApiCallRecord {
    pub timestamp: DateTime<Utc>,
    pub method: ApiMethod,
    pub endpoint: String,
    pub request_body: Value,
    pub response_body: Value,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_below_capacity_keeps_everything() {
        let mut log = BoundedLog::new(3);
        log.push(1);
        log.push(2);
        assert_eq!(log.len(), 2);
        assert_eq!(log.latest(), Some(&2));
        assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_push_at_capacity_evicts_oldest() {
        let mut log = BoundedLog::new(3);
        for n in 1..=5 {
            log.push(n);
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(log.capacity(), 3);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut log = BoundedLog::new(0);
        log.push("only");
        log.push("kept");
        assert_eq!(log.len(), 1);
        assert_eq!(log.latest(), Some(&"kept"));
    }

    #[test]
    fn test_default_capacity() {
        let log: BoundedLog<u8> = BoundedLog::default();
        assert_eq!(log.capacity(), DEFAULT_LOG_CAPACITY);
    }

    #[test]
    fn test_api_method_wire_format() {
        assert_eq!(ApiMethod::Post.to_string(), "POST");
        let json = serde_json::to_string(&ApiMethod::Patch).unwrap();
        assert_eq!(json, "\"PATCH\"");
    }
}
