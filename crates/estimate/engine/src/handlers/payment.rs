//! Invoice payment handlers. Amounts are integer minor units and the
//! outstanding balance is always recomputed from totals, never stored.

use std::collections::BTreeMap;

use estimate_types::{
    ActionKind, ActorKind, EstimateError, EstimateResult, InvoiceId, InvoiceStatus,
    WorkflowRecord, WorkflowStatus,
};

use super::{ActionContext, ActionHandler};

/// Customer pays part of the invoice. Overpayment clamps to the
/// outstanding balance.
pub struct PayPartial;

impl ActionHandler for PayPartial {
    fn action(&self) -> ActionKind {
        ActionKind::PayPartial
    }

    fn allowed_actors(&self) -> &'static [ActorKind] {
        &[ActorKind::Customer]
    }

    fn allowed_params(&self) -> &'static [&'static str] {
        &["amount_minor", "invoice_id"]
    }

    fn guard(&self, record: &WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        let amount = ctx.params.require_u64("amount_minor")?;
        payment_guard(self.action(), record, ctx)?;
        if amount == 0 {
            return Err(EstimateError::precondition(
                self.action(),
                "payment amount must be positive",
            ));
        }
        Ok(())
    }

    fn apply(&self, record: &mut WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        let amount = ctx.params.require_u64("amount_minor")?;
        settle(record, amount, ctx)
    }

    fn audit_metadata(
        &self,
        before: &WorkflowRecord,
        after: &WorkflowRecord,
        _ctx: &ActionContext<'_>,
    ) -> BTreeMap<String, String> {
        payment_metadata(before, after)
    }
}

/// Customer clears the outstanding balance in one payment.
pub struct PayFull;

impl ActionHandler for PayFull {
    fn action(&self) -> ActionKind {
        ActionKind::PayFull
    }

    fn allowed_actors(&self) -> &'static [ActorKind] {
        &[ActorKind::Customer]
    }

    fn allowed_params(&self) -> &'static [&'static str] {
        &["invoice_id"]
    }

    fn guard(&self, record: &WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        payment_guard(self.action(), record, ctx)
    }

    fn apply(&self, record: &mut WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()> {
        let balance = record
            .invoice
            .as_ref()
            .map(|invoice| invoice.balance_minor())
            .unwrap_or(0);
        settle(record, balance, ctx)
    }

    fn audit_metadata(
        &self,
        before: &WorkflowRecord,
        after: &WorkflowRecord,
        _ctx: &ActionContext<'_>,
    ) -> BTreeMap<String, String> {
        payment_metadata(before, after)
    }
}

fn payment_guard(
    action: ActionKind,
    record: &WorkflowRecord,
    ctx: &ActionContext<'_>,
) -> EstimateResult<()> {
    if let Some(raw) = ctx.params.opt_str("invoice_id")? {
        let id = InvoiceId::parse(raw)?;
        match &record.invoice {
            Some(invoice) if invoice.id == id => {}
            _ => {
                return Err(EstimateError::precondition(
                    action,
                    "payment targets a different invoice",
                ))
            }
        }
    }
    if !record.is_accepted() {
        return Err(EstimateError::precondition(
            action,
            "quote has not been accepted",
        ));
    }
    let Some(invoice) = &record.invoice else {
        return Err(EstimateError::precondition(action, "no invoice to pay"));
    };
    if !matches!(
        invoice.status,
        InvoiceStatus::Created | InvoiceStatus::PartPaid
    ) || invoice.balance_minor() == 0
    {
        return Err(EstimateError::precondition(
            action,
            "invoice is already settled",
        ));
    }
    Ok(())
}

fn settle(
    record: &mut WorkflowRecord,
    amount_minor: u64,
    ctx: &ActionContext<'_>,
) -> EstimateResult<()> {
    let Some(invoice) = record.invoice.as_mut() else {
        return Err(EstimateError::invariant("payment applied without an invoice"));
    };
    invoice.record_payment(amount_minor);
    if invoice.is_settled() {
        record.workflow.status = WorkflowStatus::Paid;
        record.workflow.paid_at = Some(ctx.now);
    }
    Ok(())
}

fn payment_metadata(before: &WorkflowRecord, after: &WorkflowRecord) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    let paid_before = before
        .invoice
        .as_ref()
        .map(|invoice| invoice.paid_minor)
        .unwrap_or(0);
    if let Some(invoice) = &after.invoice {
        metadata.insert(
            "applied_minor".to_string(),
            invoice.paid_minor.saturating_sub(paid_before).to_string(),
        );
        metadata.insert(
            "balance_minor".to_string(),
            invoice.balance_minor().to_string(),
        );
    }
    metadata
}
