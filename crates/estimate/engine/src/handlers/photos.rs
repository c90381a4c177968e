//! Site photo handlers: upload, submit for review, admin review
//! outcomes, and the photo requirement toggle.

use std::collections::BTreeMap;

use estimate_types::{
    ActionKind, ActorKind, EstimateError, EstimateResult, PhotoId, PhotoItem, PhotoRequirement,
    PhotoState, PhotoSubmissionStatus, WorkflowRecord, WorkflowStatus,
};

use super::{ActionContext, ActionHandler};

/// Customer attaches one site photo to the current submission window.
pub struct UploadPhotos;

impl ActionHandler for UploadPhotos {
    fn action(&self) -> ActionKind {
        ActionKind::UploadPhotos
    }

    fn allowed_actors(&self) -> &'static [ActorKind] {
        &[ActorKind::Customer]
    }

    fn allowed_params(&self) -> &'static [&'static str] {
        &["label"]
    }

    fn guard(&self, record: &WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        ctx.params.opt_str("label")?;
        if !record.photo_upload_open() {
            return Err(EstimateError::precondition(
                self.action(),
                "photo uploads are not open",
            ));
        }
        Ok(())
    }

    fn apply(&self, record: &mut WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        let label = match ctx.params.opt_str("label")? {
            Some(label) => label.to_string(),
            None => format!("Photo {}", record.photos.total + 1),
        };
        record.photos.items.push(PhotoItem {
            id: PhotoId::generate(),
            label,
        });
        record.photos.uploaded += 1;
        record.photos.total += 1;
        Ok(())
    }
}

/// Customer hands the uploaded photos over for admin review.
pub struct SubmitPhotos;

impl ActionHandler for SubmitPhotos {
    fn action(&self) -> ActionKind {
        ActionKind::SubmitPhotos
    }

    fn allowed_actors(&self) -> &'static [ActorKind] {
        &[ActorKind::Customer]
    }

    fn allowed_params(&self) -> &'static [&'static str] {
        &[]
    }

    fn guard(&self, record: &WorkflowRecord, _ctx: &ActionContext<'_>) -> EstimateResult<()> {
        if !record.photo_upload_open() {
            return Err(EstimateError::precondition(
                self.action(),
                "photo submission is not open",
            ));
        }
        if record.photos.uploaded == 0 {
            return Err(EstimateError::precondition(
                self.action(),
                "no photos have been uploaded",
            ));
        }
        Ok(())
    }

    fn apply(&self, record: &mut WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        record.photos.submission_status = PhotoSubmissionStatus::Submitted;
        record.photos.submitted_at = Some(ctx.now);
        record.quote.approval_requested = true;
        if record.photos.reviewed {
            // A resubmission supersedes the previous review outcome.
            record.photos.reviewed = false;
            record.photos.reviewed_at = None;
            record.photos.reviewed_by = None;
        }
        record.workflow.status = WorkflowStatus::UnderReview;
        Ok(())
    }

    fn audit_metadata(
        &self,
        _before: &WorkflowRecord,
        after: &WorkflowRecord,
        _ctx: &ActionContext<'_>,
    ) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            "photos_submitted".to_string(),
            after.photos.uploaded.to_string(),
        );
        metadata
    }
}

/// Admin reviews a submission and sends it back for changes. The
/// submission stays submitted so the customer can add photos and
/// resubmit.
pub struct RequestChanges;

impl ActionHandler for RequestChanges {
    fn action(&self) -> ActionKind {
        ActionKind::RequestChanges
    }

    fn allowed_actors(&self) -> &'static [ActorKind] {
        &[ActorKind::Admin]
    }

    fn allowed_params(&self) -> &'static [&'static str] {
        &["note"]
    }

    fn guard(&self, record: &WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        ctx.params.opt_str("note")?;
        review_guard(self.action(), record)?;
        if record.photos.reviewed && record.quote.acceptance_enabled {
            return Err(EstimateError::precondition(
                self.action(),
                "submission has already been approved",
            ));
        }
        Ok(())
    }

    fn apply(&self, record: &mut WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        record.photos.reviewed = true;
        record.photos.reviewed_at = Some(ctx.now);
        record.photos.reviewed_by = Some(ctx.actor);
        record.workflow.reviewed_at = Some(ctx.now);
        record.quote.approval_requested = false;
        record.quote.acceptance_enabled = false;
        Ok(())
    }

    fn audit_metadata(
        &self,
        _before: &WorkflowRecord,
        _after: &WorkflowRecord,
        ctx: &ActionContext<'_>,
    ) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        if let Ok(Some(note)) = ctx.params.opt_str("note") {
            metadata.insert("note".to_string(), note.to_string());
        }
        metadata
    }
}

/// Admin approves the submission and opens acceptance in one step.
pub struct ApproveAndEnable;

impl ActionHandler for ApproveAndEnable {
    fn action(&self) -> ActionKind {
        ActionKind::ApproveAndEnable
    }

    fn allowed_actors(&self) -> &'static [ActorKind] {
        &[ActorKind::Admin]
    }

    fn allowed_params(&self) -> &'static [&'static str] {
        &["note"]
    }

    fn guard(&self, record: &WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        ctx.params.opt_str("note")?;
        review_guard(self.action(), record)?;
        if record.photos.reviewed {
            return Err(EstimateError::precondition(
                self.action(),
                "submission has already been reviewed",
            ));
        }
        Ok(())
    }

    fn apply(&self, record: &mut WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        record.photos.reviewed = true;
        record.photos.reviewed_at = Some(ctx.now);
        record.photos.reviewed_by = Some(ctx.actor);
        record.workflow.reviewed_at = Some(ctx.now);
        record.quote.approval_requested = false;
        record.quote.acceptance_enabled = true;
        record.quote.enabled_at = Some(ctx.now);
        record.workflow.status = WorkflowStatus::ReadyToAccept;
        Ok(())
    }
}

/// Admin flips whether the estimate needs site photos before
/// acceptance.
pub struct TogglePhotosRequired;

impl ActionHandler for TogglePhotosRequired {
    fn action(&self) -> ActionKind {
        ActionKind::TogglePhotosRequired
    }

    fn allowed_actors(&self) -> &'static [ActorKind] {
        &[ActorKind::Admin]
    }

    fn allowed_params(&self) -> &'static [&'static str] {
        &["required"]
    }

    fn guard(&self, record: &WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        let required = ctx.params.require_bool("required")?;
        if record.is_accepted() {
            return Err(EstimateError::precondition(
                self.action(),
                "photo requirement is frozen after acceptance",
            ));
        }
        if record.is_rejected() {
            return Err(EstimateError::precondition(
                self.action(),
                "quote has been rejected",
            ));
        }
        if record.quote.photos_required == PhotoRequirement::from_flag(required) {
            return Err(EstimateError::precondition(
                self.action(),
                "photo requirement is unchanged",
            ));
        }
        Ok(())
    }

    fn apply(&self, record: &mut WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        let required = ctx.params.require_bool("required")?;
        record.quote.photos_required = PhotoRequirement::from_flag(required);
        if required {
            // An open acceptance window predates the new requirement.
            if record.quote.acceptance_enabled {
                record.quote.acceptance_enabled = false;
                record.quote.enabled_at = None;
            }
        } else {
            record.photos = PhotoState::default();
        }
        Ok(())
    }
}

fn review_guard(action: ActionKind, record: &WorkflowRecord) -> EstimateResult<()> {
    if !record.quote.photos_required.is_required() {
        return Err(EstimateError::precondition(
            action,
            "photos are not required for this estimate",
        ));
    }
    if !record.photos.submission_status.is_submitted() {
        return Err(EstimateError::precondition(
            action,
            "no photo submission to review",
        ));
    }
    if record.is_rejected() {
        return Err(EstimateError::precondition(action, "quote has been rejected"));
    }
    if record.is_accepted() {
        return Err(EstimateError::precondition(
            action,
            "quote has already been accepted",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::RequestQuote;
    use crate::FlatRatePricing;
    use chrono::Utc;
    use estimate_types::ActionParams;
    use serde_json::json;

    fn params_from(value: serde_json::Value, allowed: &[&str]) -> ActionParams {
        let map = value.as_object().cloned().unwrap_or_default();
        ActionParams::sanitized(&map, allowed).unwrap().0
    }

    fn ctx<'a>(
        actor: ActorKind,
        params: &'a ActionParams,
        pricing: &'a FlatRatePricing,
    ) -> ActionContext<'a> {
        ActionContext {
            actor,
            params,
            now: Utc::now(),
            pricing,
            portal_base_url: "https://portal.test",
        }
    }

    fn photo_record() -> WorkflowRecord {
        let mut record = WorkflowRecord::new();
        let params = ActionParams::default();
        let pricing = FlatRatePricing::default();
        RequestQuote
            .apply(&mut record, &ctx(ActorKind::Customer, &params, &pricing))
            .unwrap();
        record.quote.photos_required = PhotoRequirement::Required;
        record
    }

    fn submitted_record() -> WorkflowRecord {
        let mut record = photo_record();
        let params = ActionParams::default();
        let pricing = FlatRatePricing::default();
        let customer = ctx(ActorKind::Customer, &params, &pricing);
        UploadPhotos.apply(&mut record, &customer).unwrap();
        UploadPhotos.apply(&mut record, &customer).unwrap();
        SubmitPhotos.apply(&mut record, &customer).unwrap();
        record
    }

    #[test]
    fn test_upload_labels_and_counts() {
        let mut record = photo_record();
        let pricing = FlatRatePricing::default();
        let labelled = params_from(json!({"label": "panel closeup"}), &["label"]);
        UploadPhotos
            .apply(&mut record, &ctx(ActorKind::Customer, &labelled, &pricing))
            .unwrap();
        let unlabelled = ActionParams::default();
        UploadPhotos
            .apply(&mut record, &ctx(ActorKind::Customer, &unlabelled, &pricing))
            .unwrap();

        assert_eq!(record.photos.uploaded, 2);
        assert_eq!(record.photos.total, 2);
        assert_eq!(record.photos.items[0].label, "panel closeup");
        assert_eq!(record.photos.items[1].label, "Photo 2");
    }

    #[test]
    fn test_upload_closed_when_photos_not_required() {
        let mut record = photo_record();
        record.quote.photos_required = PhotoRequirement::Undecided;
        let params = ActionParams::default();
        let pricing = FlatRatePricing::default();
        assert!(UploadPhotos
            .guard(&record, &ctx(ActorKind::Customer, &params, &pricing))
            .is_err());
    }

    #[test]
    fn test_submit_requires_at_least_one_photo() {
        let record = photo_record();
        let params = ActionParams::default();
        let pricing = FlatRatePricing::default();
        let err = SubmitPhotos
            .guard(&record, &ctx(ActorKind::Customer, &params, &pricing))
            .unwrap_err();
        assert!(matches!(err, EstimateError::PreconditionFailed { .. }));
    }

    #[test]
    fn test_submit_moves_workflow_under_review() {
        let record = submitted_record();
        assert!(record.photos.submission_status.is_submitted());
        assert!(record.quote.approval_requested);
        assert_eq!(record.workflow.status, WorkflowStatus::UnderReview);
    }

    #[test]
    fn test_upload_blocked_after_submission_until_changes_requested() {
        let mut record = submitted_record();
        let params = ActionParams::default();
        let pricing = FlatRatePricing::default();
        let customer = ctx(ActorKind::Customer, &params, &pricing);
        assert!(UploadPhotos.guard(&record, &customer).is_err());

        let admin = ctx(ActorKind::Admin, &params, &pricing);
        RequestChanges.guard(&record, &admin).unwrap();
        RequestChanges.apply(&mut record, &admin).unwrap();

        // Changes requested reopens the window without clearing the
        // submission.
        assert!(record.photos.submission_status.is_submitted());
        assert!(UploadPhotos.guard(&record, &customer).is_ok());
        UploadPhotos.apply(&mut record, &customer).unwrap();
        assert_eq!(record.photos.uploaded, 3);

        // Resubmission clears the stale review outcome.
        SubmitPhotos.guard(&record, &customer).unwrap();
        SubmitPhotos.apply(&mut record, &customer).unwrap();
        assert!(!record.photos.reviewed);
        assert!(record.photos.reviewed_by.is_none());
    }

    #[test]
    fn test_approve_enables_acceptance_and_blocks_second_review() {
        let mut record = submitted_record();
        let params = ActionParams::default();
        let pricing = FlatRatePricing::default();
        let admin = ctx(ActorKind::Admin, &params, &pricing);

        ApproveAndEnable.guard(&record, &admin).unwrap();
        ApproveAndEnable.apply(&mut record, &admin).unwrap();

        assert!(record.quote.acceptance_enabled);
        assert!(!record.quote.approval_requested);
        assert_eq!(record.photos.reviewed_by, Some(ActorKind::Admin));
        assert_eq!(record.workflow.status, WorkflowStatus::ReadyToAccept);

        assert!(ApproveAndEnable.guard(&record, &admin).is_err());
        assert!(RequestChanges.guard(&record, &admin).is_err());
    }

    #[test]
    fn test_toggle_off_clears_photo_state() {
        let mut record = submitted_record();
        let pricing = FlatRatePricing::default();
        let off = params_from(json!({"required": false}), &["required"]);
        let admin = ctx(ActorKind::Admin, &off, &pricing);

        TogglePhotosRequired.guard(&record, &admin).unwrap();
        TogglePhotosRequired.apply(&mut record, &admin).unwrap();

        assert_eq!(record.quote.photos_required, PhotoRequirement::NotRequired);
        assert_eq!(record.photos, PhotoState::default());
    }

    #[test]
    fn test_toggle_on_revokes_open_acceptance() {
        let mut record = photo_record();
        record.quote.photos_required = PhotoRequirement::NotRequired;
        record.quote.acceptance_enabled = true;
        record.quote.enabled_at = Some(Utc::now());

        let pricing = FlatRatePricing::default();
        let on = params_from(json!({"required": true}), &["required"]);
        let admin = ctx(ActorKind::Admin, &on, &pricing);
        TogglePhotosRequired.guard(&record, &admin).unwrap();
        TogglePhotosRequired.apply(&mut record, &admin).unwrap();

        assert!(record.quote.photos_required.is_required());
        assert!(!record.quote.acceptance_enabled);
        assert!(record.quote.enabled_at.is_none());
    }

    #[test]
    fn test_toggle_same_value_is_rejected() {
        let record = photo_record();
        let pricing = FlatRatePricing::default();
        let on = params_from(json!({"required": true}), &["required"]);
        let err = TogglePhotosRequired
            .guard(&record, &ctx(ActorKind::Admin, &on, &pricing))
            .unwrap_err();
        assert!(matches!(err, EstimateError::PreconditionFailed { .. }));
    }

    #[test]
    fn test_toggle_requires_boolean_param() {
        let record = photo_record();
        let pricing = FlatRatePricing::default();
        let bad = params_from(json!({"required": "yes"}), &["required"]);
        let err = TogglePhotosRequired
            .guard(&record, &ctx(ActorKind::Admin, &bad, &pricing))
            .unwrap_err();
        assert!(matches!(err, EstimateError::MalformedParam { .. }));
    }
}
