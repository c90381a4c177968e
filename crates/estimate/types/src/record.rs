//! The workflow record: aggregate root for one estimate's lifecycle.
//!
//! The record is owned by exactly one service instance and mutated only
//! through the guarded action processor. Everything here is data plus the
//! invariant checks the processor runs before committing a transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AccountStatus, ActorKind, EstimateError, EstimateResult, InvoiceId, InvoiceStatus, PhotoId,
    PhotoRequirement, PhotoSubmissionStatus, QuoteStatus, WorkflowStatus,
};

// ── Sub-blocks ──────────────────────────────────────────────────────────

/// Progress of the workflow itself: stage, milestone timestamps, and the
/// stepper position shown to both actors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowProgress {
    pub status: WorkflowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    pub current_step: u8,
}

/// State of the quote document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteState {
    pub status: QuoteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub photos_required: PhotoRequirement,
    pub approval_requested: bool,
    pub acceptance_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_at: Option<DateTime<Utc>>,
    pub send_count: u32,
}

/// One uploaded site photo.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhotoItem {
    pub id: PhotoId,
    pub label: String,
}

/// Photo upload and review state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoState {
    pub uploaded: u32,
    pub total: u32,
    pub submission_status: PhotoSubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<ActorKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<PhotoItem>,
}

/// The invoice issued at acceptance. Absence of this record is the
/// "no invoice yet" state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: InvoiceId,
    pub number: String,
    pub status: InvoiceStatus,
    pub total_minor: u64,
    pub paid_minor: u64,
    pub created_at: DateTime<Utc>,
}

impl InvoiceRecord {
    /// Issue a fresh invoice for the given total.
    pub fn issue(total_minor: u64, now: DateTime<Utc>) -> Self {
        let id = InvoiceId::generate();
        let number = id.as_str().trim_start_matches("INV-").to_string();
        Self {
            id,
            number,
            status: InvoiceStatus::Created,
            total_minor,
            paid_minor: 0,
            created_at: now,
        }
    }

    /// Remaining balance. A projection, never stored: it cannot drift
    /// from total and paid.
    pub fn balance_minor(&self) -> u64 {
        self.total_minor.saturating_sub(self.paid_minor)
    }

    pub fn is_settled(&self) -> bool {
        self.paid_minor >= self.total_minor
    }

    /// Apply a payment, clamped to the remaining balance. Returns the
    /// amount actually applied.
    pub fn record_payment(&mut self, amount_minor: u64) -> u64 {
        let applied = amount_minor.min(self.balance_minor());
        self.paid_minor += applied;
        self.status = if self.balance_minor() == 0 {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::PartPaid
        };
        applied
    }
}

/// Customer portal account state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub status: AccountStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portal_url: Option<String>,
}

// ── Aggregate root ──────────────────────────────────────────────────────

/// The aggregate state for one customer estimate's quote-to-invoice
/// lifecycle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub workflow: WorkflowProgress,
    pub quote: QuoteState,
    pub photos: PhotoState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<InvoiceRecord>,
    pub account: AccountState,
    /// Incremented once per committed action. Backs the optimistic
    /// version check on dispatch.
    pub version: u64,
}

impl WorkflowRecord {
    /// A fresh record: nothing requested, nothing decided.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_rejected(&self) -> bool {
        self.quote.status.is_rejected()
    }

    pub fn is_accepted(&self) -> bool {
        matches!(
            self.workflow.status,
            WorkflowStatus::Accepted | WorkflowStatus::Paid
        )
    }

    /// The resubmission window: admin reviewed the photos, requested
    /// changes instead of enabling acceptance, and the submission is
    /// still in place waiting to be replaced.
    pub fn resubmission_open(&self) -> bool {
        self.photos.submission_status.is_submitted()
            && self.photos.reviewed
            && !self.quote.acceptance_enabled
    }

    /// Whether the customer may add photos right now. Shared by the
    /// permission computer and the upload guard so the two cannot
    /// disagree.
    pub fn photo_upload_open(&self) -> bool {
        self.quote.photos_required.is_required()
            && self.workflow.status.has_left_requested()
            && !self.is_accepted()
            && !self.is_rejected()
            && (!self.photos.submission_status.is_submitted() || self.resubmission_open())
    }

    /// Check the model invariants. The processor runs this after every
    /// transition and refuses to commit a violating record.
    pub fn verify_invariants(&self) -> EstimateResult<()> {
        if let Some(invoice) = &self.invoice {
            if invoice.paid_minor > invoice.total_minor {
                return Err(EstimateError::invariant(format!(
                    "invoice paid {} exceeds total {}",
                    invoice.paid_minor, invoice.total_minor
                )));
            }
        }
        if self.quote.acceptance_enabled
            && self.quote.photos_required.is_required()
            && !self.photos.reviewed
        {
            return Err(EstimateError::invariant(
                "acceptance enabled while required photos are unreviewed",
            ));
        }
        if self.photos.submission_status.is_submitted() && self.photos.uploaded == 0 {
            return Err(EstimateError::invariant(
                "photos submitted with zero uploads",
            ));
        }
        if self.photos.uploaded > self.photos.total {
            return Err(EstimateError::invariant(format!(
                "uploaded count {} exceeds total {}",
                self.photos.uploaded, self.photos.total
            )));
        }
        if self.photos.items.len() != self.photos.total as usize {
            return Err(EstimateError::invariant(format!(
                "photo item list length {} does not match total {}",
                self.photos.items.len(),
                self.photos.total
            )));
        }
        if self.is_accepted() && self.quote.status == QuoteStatus::Rejected {
            return Err(EstimateError::invariant(
                "record both accepted and rejected",
            ));
        }
        Ok(())
    }
}
