//! Closed status enums for every field of the workflow record, plus the
//! derived display status and the actor vocabulary.
//!
//! Each status field is its own enum so a new state is a compile error at
//! every match site, never a silent fallthrough.

use serde::{Deserialize, Serialize};

// ── Workflow ────────────────────────────────────────────────────────────

/// Stage of the estimate workflow. Progresses in a strict total order;
/// rejection is tracked on the quote, not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Initial state, before the customer has requested a quote.
    #[default]
    NotStarted,
    Requested,
    Sent,
    UnderReview,
    ReadyToAccept,
    Accepted,
    Paid,
}

impl WorkflowStatus {
    /// Position in the total order, for monotonicity checks.
    pub fn rank(&self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::Requested => 1,
            Self::Sent => 2,
            Self::UnderReview => 3,
            Self::ReadyToAccept => 4,
            Self::Accepted => 5,
            Self::Paid => 6,
        }
    }

    /// True once the workflow has moved past the request stage.
    pub fn has_left_requested(&self) -> bool {
        self.rank() > Self::Requested.rank()
    }
}

// ── Quote ───────────────────────────────────────────────────────────────

/// Lifecycle of the quote document itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    #[default]
    NotSent,
    Sent,
    Accepted,
    Rejected,
}

impl QuoteStatus {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }
}

/// Whether the quote needs site photos before acceptance. Tri-state: an
/// admin may not have decided yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhotoRequirement {
    #[default]
    Undecided,
    Required,
    NotRequired,
}

impl PhotoRequirement {
    /// True only when photos are positively required. Undecided counts as
    /// not required everywhere a guard asks.
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Required)
    }

    pub fn from_flag(required: bool) -> Self {
        if required {
            Self::Required
        } else {
            Self::NotRequired
        }
    }
}

// ── Photos ──────────────────────────────────────────────────────────────

/// Whether the customer has submitted their uploads for review.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhotoSubmissionStatus {
    #[default]
    NotSubmitted,
    Submitted,
}

impl PhotoSubmissionStatus {
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted)
    }
}

// ── Invoice ─────────────────────────────────────────────────────────────

/// Payment state of an issued invoice. A record only exists once the
/// quote is accepted, so there is no "null" variant here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Created,
    PartPaid,
    Paid,
}

// ── Account ─────────────────────────────────────────────────────────────

/// Customer portal account state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    NotInvited,
    Invited,
    Active,
}

// ── Actors ──────────────────────────────────────────────────────────────

/// Who is issuing a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Customer,
    Admin,
    System,
}

impl std::fmt::Display for ActorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
            Self::System => "system",
        };
        write!(f, "{name}")
    }
}

// ── Display status ──────────────────────────────────────────────────────

/// The single human-facing status derived from the raw record by the
/// priority-ordered rules in the engine crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayStatus {
    Rejected,
    QuoteRequested,
    AwaitingPhotos,
    PhotosUnderReview,
    ChangesRequested,
    ReadyToAccept,
    Paid,
    PartPaid,
    InvoiceCreated,
    Accepted,
    EstimateSent,
}

impl DisplayStatus {
    /// Human label for log lines and the demo.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rejected => "Rejected",
            Self::QuoteRequested => "Quote requested",
            Self::AwaitingPhotos => "Awaiting photos",
            Self::PhotosUnderReview => "Photos under review",
            Self::ChangesRequested => "Changes requested",
            Self::ReadyToAccept => "Ready to accept",
            Self::Paid => "Paid",
            Self::PartPaid => "Partially paid",
            Self::InvoiceCreated => "Invoice created",
            Self::Accepted => "Accepted",
            Self::EstimateSent => "Estimate sent",
        }
    }

    /// Stepper position for this status, or None when the step should
    /// stay frozen (rejection keeps whatever step was reached).
    pub fn step(&self) -> Option<u8> {
        match self {
            Self::Rejected => None,
            Self::QuoteRequested => Some(0),
            Self::EstimateSent => Some(1),
            Self::AwaitingPhotos | Self::PhotosUnderReview | Self::ChangesRequested => Some(2),
            Self::ReadyToAccept => Some(3),
            Self::Accepted | Self::InvoiceCreated | Self::PartPaid => Some(4),
            Self::Paid => Some(5),
        }
    }
}

impl std::fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
