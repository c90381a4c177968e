//! Derived capability and visibility flags.
//!
//! Flags exist so a caller can pre-filter the actions it offers each
//! actor. They are advisory: the processor re-validates every guard at
//! dispatch time, because state may have changed in between.

use serde::{Deserialize, Serialize};

use estimate_types::{InvoiceStatus, QuoteStatus, WorkflowRecord, WorkflowStatus};

/// What each actor may currently do, and which panels make sense to show.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub can_upload_photos: bool,
    pub can_submit_photos: bool,
    pub can_accept: bool,
    pub can_pay: bool,
    pub admin_can_enable_acceptance: bool,
    pub admin_can_approve_and_enable: bool,
    pub admin_can_request_changes: bool,
    pub admin_can_toggle_photos_required: bool,
    pub shows_photo_section: bool,
    pub shows_invoice_section: bool,
}

/// Compute the permission set for one record snapshot.
///
/// Pure and deterministic, exactly like the status resolver.
pub fn compute_permissions(record: &WorkflowRecord) -> PermissionSet {
    let quote = &record.quote;
    let photos = &record.photos;
    let accepted = record.is_accepted();
    let rejected = record.is_rejected();
    let submitted = photos.submission_status.is_submitted();

    let can_upload_photos = record.photo_upload_open();

    let can_pay = accepted
        && record.invoice.as_ref().is_some_and(|invoice| {
            matches!(
                invoice.status,
                InvoiceStatus::Created | InvoiceStatus::PartPaid
            ) && invoice.balance_minor() > 0
        });

    let admin_can_enable_acceptance = !quote.photos_required.is_required()
        && !quote.acceptance_enabled
        && quote.status == QuoteStatus::Sent
        && matches!(
            record.workflow.status,
            WorkflowStatus::Sent | WorkflowStatus::UnderReview | WorkflowStatus::ReadyToAccept
        );

    let admin_can_review = quote.photos_required.is_required()
        && submitted
        && !photos.reviewed
        && !accepted
        && !rejected;

    PermissionSet {
        can_upload_photos,
        can_submit_photos: can_upload_photos && photos.uploaded > 0,
        can_accept: quote.acceptance_enabled && !accepted && !rejected,
        can_pay,
        admin_can_enable_acceptance,
        admin_can_approve_and_enable: admin_can_review,
        admin_can_request_changes: admin_can_review,
        admin_can_toggle_photos_required: !accepted && !rejected,
        shows_photo_section: quote.photos_required.is_required(),
        shows_invoice_section: record.invoice.is_some(),
    }
}
