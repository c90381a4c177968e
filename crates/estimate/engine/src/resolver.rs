//! Display status resolution.
//!
//! A record's raw flags are not mutually exclusive: a rejected quote may
//! still carry an enabled acceptance flag from before, an accepted one
//! still carries its photo review trail. The resolver therefore runs a
//! fixed priority ladder and returns the first match. The evaluation
//! order is a contract; rejection is checked first regardless of any
//! other flag.

use estimate_types::{DisplayStatus, InvoiceStatus, WorkflowRecord, WorkflowStatus};

/// Derive the single human-facing status for a record.
///
/// Pure: same record in, same status out, no state anywhere.
pub fn resolve_display_status(record: &WorkflowRecord) -> DisplayStatus {
    // Rule 1: rejection wins over everything.
    if record.is_rejected() {
        return DisplayStatus::Rejected;
    }

    // Rule 2: nothing sent yet.
    if matches!(
        record.workflow.status,
        WorkflowStatus::NotStarted | WorkflowStatus::Requested
    ) {
        return DisplayStatus::QuoteRequested;
    }

    // Rules 3-5: the photo approval ladder.
    if record.quote.photos_required.is_required() {
        if !record.photos.submission_status.is_submitted() {
            return DisplayStatus::AwaitingPhotos;
        }
        if !record.photos.reviewed {
            return DisplayStatus::PhotosUnderReview;
        }
        if !record.quote.acceptance_enabled {
            return DisplayStatus::ChangesRequested;
        }
    }

    // Rule 6: enabled but not yet accepted.
    if record.quote.acceptance_enabled && !record.is_accepted() {
        return DisplayStatus::ReadyToAccept;
    }

    // Rules 7-10: the accepted branch, exhaustive over the invoice state.
    if record.is_accepted() {
        return match &record.invoice {
            None => DisplayStatus::Accepted,
            Some(invoice) => match invoice.status {
                InvoiceStatus::Paid => DisplayStatus::Paid,
                InvoiceStatus::PartPaid => DisplayStatus::PartPaid,
                InvoiceStatus::Created => DisplayStatus::InvoiceCreated,
            },
        };
    }

    // Rule 11: sent, nothing else going on.
    DisplayStatus::EstimateSent
}
