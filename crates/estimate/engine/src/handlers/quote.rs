//! Quote lifecycle handlers: request, enable acceptance, accept,
//! reject, and the full reset.

use std::collections::BTreeMap;

use uuid::Uuid;

use estimate_types::{
    short_token, AccountStatus, ActionKind, ActorKind, EstimateError, EstimateResult,
    InvoiceRecord, QuoteStatus, WorkflowRecord, WorkflowStatus,
};

use super::{ActionContext, ActionHandler};

/// Customer asks for a quote. Sends the estimate and invites the
/// customer to the portal in one step.
pub struct RequestQuote;

impl ActionHandler for RequestQuote {
    fn action(&self) -> ActionKind {
        ActionKind::RequestQuote
    }

    fn allowed_actors(&self) -> &'static [ActorKind] {
        &[ActorKind::Customer]
    }

    fn allowed_params(&self) -> &'static [&'static str] {
        &["estimate_id", "location_id"]
    }

    fn guard(&self, record: &WorkflowRecord, _ctx: &ActionContext<'_>) -> EstimateResult<()> {
        if record.workflow.status != WorkflowStatus::NotStarted
            || record.quote.status != QuoteStatus::NotSent
        {
            return Err(EstimateError::precondition(
                self.action(),
                "quote has already been requested",
            ));
        }
        Ok(())
    }

    fn apply(&self, record: &mut WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        record.quote.status = QuoteStatus::Sent;
        record.quote.number = Some(format!("Q-{}", short_token()));
        record.quote.sent_at = Some(ctx.now);
        record.quote.send_count += 1;
        record.workflow.status = WorkflowStatus::Sent;
        record.workflow.requested_at = Some(ctx.now);

        let token = Uuid::new_v4().simple().to_string();
        record.account.status = AccountStatus::Invited;
        record.account.portal_url = Some(format!(
            "{}/estimate/{}",
            ctx.portal_base_url.trim_end_matches('/'),
            token
        ));
        record.account.invite_token = Some(token);
        Ok(())
    }

    fn audit_metadata(
        &self,
        _before: &WorkflowRecord,
        after: &WorkflowRecord,
        _ctx: &ActionContext<'_>,
    ) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        if let Some(number) = &after.quote.number {
            metadata.insert("quote_number".to_string(), number.clone());
        }
        metadata
    }
}

/// Admin opens acceptance on a quote that does not need photos.
pub struct EnableAcceptance;

impl ActionHandler for EnableAcceptance {
    fn action(&self) -> ActionKind {
        ActionKind::EnableAcceptance
    }

    fn allowed_actors(&self) -> &'static [ActorKind] {
        &[ActorKind::Admin]
    }

    fn allowed_params(&self) -> &'static [&'static str] {
        &[]
    }

    fn guard(&self, record: &WorkflowRecord, _ctx: &ActionContext<'_>) -> EstimateResult<()> {
        if record.quote.photos_required.is_required() {
            return Err(EstimateError::precondition(
                self.action(),
                "photos are required; acceptance opens through review approval",
            ));
        }
        if record.quote.status != QuoteStatus::Sent {
            return Err(EstimateError::precondition(
                self.action(),
                "quote is not in a sent state",
            ));
        }
        if record.quote.acceptance_enabled {
            return Err(EstimateError::precondition(
                self.action(),
                "acceptance is already enabled",
            ));
        }
        Ok(())
    }

    fn apply(&self, record: &mut WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        record.quote.acceptance_enabled = true;
        record.quote.enabled_at = Some(ctx.now);
        record.workflow.status = WorkflowStatus::ReadyToAccept;
        Ok(())
    }
}

/// Customer accepts the quote. Issues the invoice and activates the
/// portal account in the same transition.
pub struct AcceptQuote;

impl ActionHandler for AcceptQuote {
    fn action(&self) -> ActionKind {
        ActionKind::Accept
    }

    fn allowed_actors(&self) -> &'static [ActorKind] {
        &[ActorKind::Customer]
    }

    fn allowed_params(&self) -> &'static [&'static str] {
        &[]
    }

    fn guard(&self, record: &WorkflowRecord, _ctx: &ActionContext<'_>) -> EstimateResult<()> {
        if record.is_rejected() {
            return Err(EstimateError::precondition(
                self.action(),
                "a rejected quote cannot be accepted",
            ));
        }
        if record.is_accepted() {
            return Err(EstimateError::precondition(
                self.action(),
                "quote has already been accepted",
            ));
        }
        if !record.quote.acceptance_enabled {
            return Err(EstimateError::precondition(
                self.action(),
                "acceptance is not enabled",
            ));
        }
        Ok(())
    }

    fn apply(&self, record: &mut WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        let total_minor = ctx.pricing.quote_total_minor(record);
        record.quote.status = QuoteStatus::Accepted;
        record.quote.accepted_at = Some(ctx.now);
        record.workflow.status = WorkflowStatus::Accepted;
        record.workflow.accepted_at = Some(ctx.now);
        record.invoice = Some(InvoiceRecord::issue(total_minor, ctx.now));
        record.account.status = AccountStatus::Active;
        Ok(())
    }

    fn audit_metadata(
        &self,
        _before: &WorkflowRecord,
        after: &WorkflowRecord,
        _ctx: &ActionContext<'_>,
    ) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        if let Some(invoice) = &after.invoice {
            metadata.insert("invoice_id".to_string(), invoice.id.to_string());
            metadata.insert("total_minor".to_string(), invoice.total_minor.to_string());
        }
        metadata
    }
}

/// Any actor closes the workflow by rejecting the quote.
pub struct RejectQuote;

impl ActionHandler for RejectQuote {
    fn action(&self) -> ActionKind {
        ActionKind::Reject
    }

    fn allowed_actors(&self) -> &'static [ActorKind] {
        &[ActorKind::Customer, ActorKind::Admin, ActorKind::System]
    }

    fn allowed_params(&self) -> &'static [&'static str] {
        &["reason"]
    }

    fn guard(&self, record: &WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        ctx.params.opt_str("reason")?;
        if !record.workflow.status.has_left_requested() {
            return Err(EstimateError::precondition(
                self.action(),
                "no sent quote to reject",
            ));
        }
        if record.is_accepted() {
            return Err(EstimateError::precondition(
                self.action(),
                "an accepted quote cannot be rejected",
            ));
        }
        if record.is_rejected() {
            return Err(EstimateError::precondition(
                self.action(),
                "quote has already been rejected",
            ));
        }
        Ok(())
    }

    fn apply(&self, record: &mut WorkflowRecord, _ctx: &ActionContext<'_>) -> EstimateResult<()> {
        record.quote.status = QuoteStatus::Rejected;
        record.quote.acceptance_enabled = false;
        record.quote.enabled_at = None;
        Ok(())
    }

    fn audit_metadata(
        &self,
        _before: &WorkflowRecord,
        _after: &WorkflowRecord,
        ctx: &ActionContext<'_>,
    ) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        if let Ok(Some(reason)) = ctx.params.opt_str("reason") {
            metadata.insert("reason".to_string(), reason.to_string());
        }
        metadata
    }
}

/// Wipes the workflow back to its initial state. Always permitted.
pub struct ResetWorkflow;

impl ActionHandler for ResetWorkflow {
    fn action(&self) -> ActionKind {
        ActionKind::Reset
    }

    fn allowed_actors(&self) -> &'static [ActorKind] {
        &[ActorKind::Customer, ActorKind::Admin, ActorKind::System]
    }

    fn allowed_params(&self) -> &'static [&'static str] {
        &[]
    }

    fn guard(&self, _record: &WorkflowRecord, _ctx: &ActionContext<'_>) -> EstimateResult<()> {
        Ok(())
    }

    fn apply(&self, record: &mut WorkflowRecord, _ctx: &ActionContext<'_>) -> EstimateResult<()> {
        *record = WorkflowRecord::new();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlatRatePricing;
    use chrono::Utc;
    use estimate_types::{ActionParams, PhotoRequirement};

    fn empty_params() -> ActionParams {
        ActionParams::default()
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

    fn sent_record() -> WorkflowRecord {
        let mut record = WorkflowRecord::new();
        let params = empty_params();
        let pricing = FlatRatePricing::default();
        RequestQuote
            .apply(&mut record, &ctx(ActorKind::Customer, &params, &pricing))
            .unwrap();
        record
    }

    #[test]
    fn test_request_quote_sends_and_invites() {
        let record = sent_record();
        assert_eq!(record.quote.status, QuoteStatus::Sent);
        assert_eq!(record.workflow.status, WorkflowStatus::Sent);
        assert_eq!(record.quote.send_count, 1);
        assert!(record.quote.number.as_deref().unwrap_or("").starts_with("Q-"));
        assert_eq!(record.account.status, AccountStatus::Invited);
        let token = record.account.invite_token.clone().unwrap();
        let url = record.account.portal_url.clone().unwrap();
        assert_eq!(url, format!("https://portal.test/estimate/{token}"));
    }

    #[test]
    fn test_request_quote_rejects_second_request() {
        let record = sent_record();
        let params = empty_params();
        let pricing = FlatRatePricing::default();
        let err = RequestQuote
            .guard(&record, &ctx(ActorKind::Customer, &params, &pricing))
            .unwrap_err();
        assert!(matches!(err, EstimateError::PreconditionFailed { .. }));
    }

    #[test]
    fn test_enable_acceptance_blocked_while_photos_required() {
        let mut record = sent_record();
        record.quote.photos_required = PhotoRequirement::Required;
        let params = empty_params();
        let pricing = FlatRatePricing::default();
        assert!(EnableAcceptance
            .guard(&record, &ctx(ActorKind::Admin, &params, &pricing))
            .is_err());

        record.quote.photos_required = PhotoRequirement::NotRequired;
        assert!(EnableAcceptance
            .guard(&record, &ctx(ActorKind::Admin, &params, &pricing))
            .is_ok());
    }

    #[test]
    fn test_accept_requires_enabled_acceptance() {
        let mut record = sent_record();
        let params = empty_params();
        let pricing = FlatRatePricing::new(65_000);
        let context = ctx(ActorKind::Customer, &params, &pricing);
        assert!(AcceptQuote.guard(&record, &context).is_err());

        record.quote.acceptance_enabled = true;
        AcceptQuote.guard(&record, &context).unwrap();
        AcceptQuote.apply(&mut record, &context).unwrap();

        assert_eq!(record.workflow.status, WorkflowStatus::Accepted);
        assert_eq!(record.account.status, AccountStatus::Active);
        let invoice = record.invoice.as_ref().unwrap();
        assert_eq!(invoice.total_minor, 65_000);
        assert_eq!(invoice.balance_minor(), 65_000);
    }

    #[test]
    fn test_reject_clears_acceptance_window() {
        let mut record = sent_record();
        record.quote.acceptance_enabled = true;
        record.quote.enabled_at = Some(Utc::now());
        let params = empty_params();
        let pricing = FlatRatePricing::default();
        let context = ctx(ActorKind::Admin, &params, &pricing);

        RejectQuote.guard(&record, &context).unwrap();
        RejectQuote.apply(&mut record, &context).unwrap();

        assert!(record.is_rejected());
        assert!(!record.quote.acceptance_enabled);
        assert!(record.quote.enabled_at.is_none());
    }

    #[test]
    fn test_reject_blocked_before_send_and_after_accept() {
        let params = empty_params();
        let pricing = FlatRatePricing::default();
        let context = ctx(ActorKind::System, &params, &pricing);

        let fresh = WorkflowRecord::new();
        assert!(RejectQuote.guard(&fresh, &context).is_err());

        let mut accepted = sent_record();
        accepted.quote.acceptance_enabled = true;
        AcceptQuote
            .apply(&mut accepted, &ctx(ActorKind::Customer, &params, &pricing))
            .unwrap();
        assert!(RejectQuote.guard(&accepted, &context).is_err());
    }

    #[test]
    fn test_reset_returns_to_initial_state() {
        let mut record = sent_record();
        let params = empty_params();
        let pricing = FlatRatePricing::default();
        let context = ctx(ActorKind::Admin, &params, &pricing);

        ResetWorkflow.guard(&record, &context).unwrap();
        ResetWorkflow.apply(&mut record, &context).unwrap();
        assert_eq!(record, WorkflowRecord::new());
    }
}
