//! Audit receipts: immutable records of applied actions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ActionKind, ActorKind};

/// Immutable record of one applied action: who, what, which fields
/// changed. Produced by the processor, referenced from the event log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub actor: ActorKind,
    pub action: ActionKind,
    pub summary: String,
    pub changed_paths: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl AuditRecord {
    pub fn new(
        actor: ActorKind,
        action: ActionKind,
        summary: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor,
            action,
            summary: summary.into(),
            changed_paths: Vec::new(),
            timestamp,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_changed_paths(mut self, paths: Vec<String>) -> Self {
        self.changed_paths = paths;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
