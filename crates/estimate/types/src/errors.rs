//! Error types for the estimate workflow engine.
//!
//! Every variant is a rejected no-op: the record is never partially
//! mutated, and nothing here is thrown. The three failure classes differ
//! only in how loudly the dispatcher traces them.

use crate::ActionKind;

/// Failure class of a rejection. The dispatcher picks its trace level
/// from this, nothing else in the control flow depends on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectionClass {
    /// Guard failed against current state. Expected and frequent
    /// (ordinary UI races); handled silently.
    Precondition,
    /// Unrecognized action, disallowed parameter key, wrong parameter
    /// type, or an identifier failing shape validation. Logged, then
    /// rejected the same way as a precondition failure.
    MalformedInput,
    /// A transition would have committed a record violating the model
    /// invariants. Should never occur if guards are correct.
    InvariantViolation,
}

/// Errors surfaced by the command interface.
#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    #[error("precondition failed for {action}: {reason}")]
    PreconditionFailed { action: ActionKind, reason: String },

    #[error("version conflict: expected {expected}, record is at {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("forbidden parameter key: {0}")]
    ForbiddenParamKey(String),

    #[error("malformed parameter {key}: expected {expected}")]
    MalformedParam { key: String, expected: &'static str },

    #[error("malformed {kind} identifier: {value}")]
    MalformedIdentifier { kind: &'static str, value: String },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EstimateError {
    /// Shorthand for a guard failure.
    pub fn precondition(action: ActionKind, reason: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            action,
            reason: reason.into(),
        }
    }

    /// Shorthand for an invariant violation.
    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::InvariantViolation(reason.into())
    }

    /// The failure class this rejection belongs to.
    pub fn class(&self) -> RejectionClass {
        match self {
            Self::PreconditionFailed { .. } | Self::VersionConflict { .. } => {
                RejectionClass::Precondition
            }
            Self::UnknownAction(_)
            | Self::ForbiddenParamKey(_)
            | Self::MalformedParam { .. }
            | Self::MalformedIdentifier { .. } => RejectionClass::MalformedInput,
            Self::InvariantViolation(_) | Self::Serialization(_) => {
                RejectionClass::InvariantViolation
            }
        }
    }
}

pub type EstimateResult<T> = Result<T, EstimateError>;
