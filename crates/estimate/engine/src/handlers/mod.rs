//! Action handlers: one guarded transition per canonical action.
//!
//! Each handler owns its allow-listed params, its permitted actors, a
//! guard that only reads, and a transition that only runs on a scratch
//! copy. The processor wires them into a registry so no action's guard
//! logic can leak into another's.

mod payment;
mod photos;
mod quote;

pub use payment::*;
pub use photos::*;
pub use quote::*;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use estimate_types::{ActionKind, ActionParams, ActorKind, EstimateResult, WorkflowRecord};

use crate::QuotePricing;

/// Parameter keys every action accepts in addition to its own.
pub const UNIVERSAL_PARAM_KEYS: [&str; 1] = ["expected_version"];

/// Everything a guard or transition may consult besides the record.
pub struct ActionContext<'a> {
    pub actor: ActorKind,
    pub params: &'a ActionParams,
    pub now: DateTime<Utc>,
    pub pricing: &'a dyn QuotePricing,
    pub portal_base_url: &'a str,
}

/// One guarded transition in the action registry.
pub trait ActionHandler: Send + Sync {
    /// The action this handler implements.
    fn action(&self) -> ActionKind;

    /// Actors allowed to issue the action.
    fn allowed_actors(&self) -> &'static [ActorKind];

    /// Parameter keys accepted from the boundary; everything else is
    /// dropped before the handler ever sees it.
    fn allowed_params(&self) -> &'static [&'static str];

    /// Precondition check against the current record. Must not mutate.
    fn guard(&self, record: &WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()>;

    /// State transition. Runs on a scratch copy after the guard passes;
    /// the processor discards the copy if anything fails.
    fn apply(&self, record: &mut WorkflowRecord, ctx: &ActionContext<'_>) -> EstimateResult<()>;

    /// Extra key/values for the audit record, derived from the committed
    /// change.
    fn audit_metadata(
        &self,
        _before: &WorkflowRecord,
        _after: &WorkflowRecord,
        _ctx: &ActionContext<'_>,
    ) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// The full handler roster for the canonical action set.
pub(crate) fn standard_handlers() -> Vec<Box<dyn ActionHandler>> {
    vec![
        Box::new(RequestQuote),
        Box::new(UploadPhotos),
        Box::new(SubmitPhotos),
        Box::new(RequestChanges),
        Box::new(ApproveAndEnable),
        Box::new(EnableAcceptance),
        Box::new(TogglePhotosRequired),
        Box::new(AcceptQuote),
        Box::new(PayPartial),
        Box::new(PayFull),
        Box::new(RejectQuote),
        Box::new(ResetWorkflow),
    ]
}
