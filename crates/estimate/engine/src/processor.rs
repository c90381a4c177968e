//! Registry-driven action processor.
//!
//! Every action runs the same pipeline: resolve the handler, check the
//! actor, check the caller's version expectation, run the guard, apply
//! the transition to a scratch copy, then verify the aggregate
//! invariants before anything is handed back. A failure at any step
//! leaves the caller's record untouched.

use std::collections::HashMap;

use estimate_types::{
    ActionKind, AuditRecord, EstimateError, EstimateResult, StateDelta, WorkflowRecord,
};

use crate::differ::{diff_records, DEFAULT_MAX_DIFF_DEPTH};
use crate::handlers::{standard_handlers, ActionContext, ActionHandler};
use crate::resolver::resolve_display_status;

/// Lookup table from action kind to its handler.
pub struct ActionRegistry {
    handlers: HashMap<ActionKind, Box<dyn ActionHandler>>,
}

impl ActionRegistry {
    /// Registry with every canonical action installed.
    pub fn standard() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };
        for handler in standard_handlers() {
            registry.register(handler);
        }
        registry
    }

    /// Install a handler, replacing any existing one for the same
    /// action.
    pub fn register(&mut self, handler: Box<dyn ActionHandler>) {
        self.handlers.insert(handler.action(), handler);
    }

    pub fn get(&self, kind: ActionKind) -> Option<&dyn ActionHandler> {
        self.handlers.get(&kind).map(Box::as_ref)
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Everything produced by one committed action.
#[derive(Debug)]
pub struct ActionOutcome {
    /// The next record, version already bumped.
    pub record: WorkflowRecord,
    /// Field-level changes between the old and new record.
    pub delta: StateDelta,
    /// Audit receipt for the journals.
    pub audit: AuditRecord,
}

/// Applies actions all-or-nothing against an immutable input record.
pub struct ActionProcessor {
    registry: ActionRegistry,
    max_diff_depth: usize,
}

impl ActionProcessor {
    pub fn new(registry: ActionRegistry, max_diff_depth: usize) -> Self {
        Self {
            registry,
            max_diff_depth,
        }
    }

    /// Processor with the canonical handler roster and default diff
    /// depth.
    pub fn standard() -> Self {
        Self::new(ActionRegistry::standard(), DEFAULT_MAX_DIFF_DEPTH)
    }

    pub fn handler(&self, kind: ActionKind) -> Option<&dyn ActionHandler> {
        self.registry.get(kind)
    }

    /// Run one action against `record`. On success the returned outcome
    /// carries the replacement record; on failure `record` is untouched
    /// and the error's class says how the caller should report it.
    pub fn apply(
        &self,
        record: &WorkflowRecord,
        kind: ActionKind,
        ctx: &ActionContext<'_>,
    ) -> EstimateResult<ActionOutcome> {
        let handler = self
            .registry
            .get(kind)
            .ok_or_else(|| EstimateError::UnknownAction(kind.name().to_string()))?;

        if !handler.allowed_actors().contains(&ctx.actor) {
            return Err(EstimateError::precondition(
                kind,
                format!("actor {} may not issue this action", ctx.actor),
            ));
        }

        if let Some(expected) = ctx.params.opt_u64("expected_version")? {
            if expected != record.version {
                return Err(EstimateError::VersionConflict {
                    expected,
                    actual: record.version,
                });
            }
        }

        handler.guard(record, ctx)?;

        let mut updated = record.clone();
        handler.apply(&mut updated, ctx)?;
        updated.version = record.version + 1;

        // Rejection freezes the step indicator at its last value.
        if let Some(step) = resolve_display_status(&updated).step() {
            updated.workflow.current_step = step;
        }

        if kind != ActionKind::Reset
            && updated.workflow.status.rank() < record.workflow.status.rank()
        {
            return Err(EstimateError::invariant(format!(
                "workflow moved backwards from {:?} to {:?}",
                record.workflow.status, updated.workflow.status
            )));
        }

        updated.verify_invariants()?;

        let delta = diff_records(record, &updated, self.max_diff_depth)?;
        let mut audit = AuditRecord::new(ctx.actor, kind, kind.label(), ctx.now)
            .with_changed_paths(delta.paths().map(str::to_string).collect());
        audit.metadata = handler.audit_metadata(record, &updated, ctx);

        Ok(ActionOutcome {
            record: updated,
            delta,
            audit,
        })
    }
}

impl Default for ActionProcessor {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlatRatePricing;
    use chrono::Utc;
    use estimate_types::{ActionParams, ActorKind, RejectionClass};
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

    #[test]
    fn test_committed_action_bumps_version_and_diffs() {
        let processor = ActionProcessor::standard();
        let record = WorkflowRecord::new();
        let params = ActionParams::default();
        let pricing = FlatRatePricing::default();

        let outcome = processor
            .apply(
                &record,
                ActionKind::RequestQuote,
                &ctx(ActorKind::Customer, &params, &pricing),
            )
            .unwrap();

        assert_eq!(outcome.record.version, 1);
        assert!(!outcome.delta.is_empty());
        assert!(outcome.delta.contains("version"));
        assert!(outcome.delta.contains("quote.status"));
        assert_eq!(outcome.audit.action, ActionKind::RequestQuote);
        assert!(!outcome.audit.changed_paths.is_empty());
        // Input record is never mutated.
        assert_eq!(record, WorkflowRecord::new());
    }

    #[test]
    fn test_disallowed_actor_is_a_precondition_failure() {
        let processor = ActionProcessor::standard();
        let record = WorkflowRecord::new();
        let params = ActionParams::default();
        let pricing = FlatRatePricing::default();

        let err = processor
            .apply(
                &record,
                ActionKind::RequestQuote,
                &ctx(ActorKind::Admin, &params, &pricing),
            )
            .unwrap_err();
        assert_eq!(err.class(), RejectionClass::Precondition);
    }

    #[test]
    fn test_version_conflict_when_expectation_is_stale() {
        let processor = ActionProcessor::standard();
        let record = WorkflowRecord::new();
        let pricing = FlatRatePricing::default();

        let stale = params_from(json!({"expected_version": 7}), &["expected_version"]);
        let err = processor
            .apply(
                &record,
                ActionKind::RequestQuote,
                &ctx(ActorKind::Customer, &stale, &pricing),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            EstimateError::VersionConflict {
                expected: 7,
                actual: 0
            }
        ));

        let current = params_from(json!({"expected_version": 0}), &["expected_version"]);
        assert!(processor
            .apply(
                &record,
                ActionKind::RequestQuote,
                &ctx(ActorKind::Customer, &current, &pricing),
            )
            .is_ok());
    }

    #[test]
    fn test_step_indicator_follows_display_status() {
        let processor = ActionProcessor::standard();
        let params = ActionParams::default();
        let pricing = FlatRatePricing::default();
        let customer = ctx(ActorKind::Customer, &params, &pricing);

        let record = WorkflowRecord::new();
        assert_eq!(record.workflow.current_step, 0);

        let outcome = processor
            .apply(&record, ActionKind::RequestQuote, &customer)
            .unwrap();
        assert_eq!(outcome.record.workflow.current_step, 1);
    }

    #[test]
    fn test_rejection_keeps_last_step() {
        let processor = ActionProcessor::standard();
        let params = ActionParams::default();
        let pricing = FlatRatePricing::default();
        let customer = ctx(ActorKind::Customer, &params, &pricing);

        let record = WorkflowRecord::new();
        let sent = processor
            .apply(&record, ActionKind::RequestQuote, &customer)
            .unwrap()
            .record;
        let rejected = processor
            .apply(&sent, ActionKind::Reject, &customer)
            .unwrap()
            .record;
        assert_eq!(rejected.workflow.current_step, 1);
    }

    #[test]
    fn test_reset_is_exempt_from_forward_only_rule() {
        let processor = ActionProcessor::standard();
        let params = ActionParams::default();
        let pricing = FlatRatePricing::default();
        let customer = ctx(ActorKind::Customer, &params, &pricing);

        let record = WorkflowRecord::new();
        let sent = processor
            .apply(&record, ActionKind::RequestQuote, &customer)
            .unwrap()
            .record;
        let reset = processor
            .apply(&sent, ActionKind::Reset, &customer)
            .unwrap()
            .record;

        assert_eq!(reset.workflow.status, Default::default());
        // Version keeps counting across a reset.
        assert_eq!(reset.version, 2);
    }

    #[test]
    fn test_replacing_a_handler_changes_behavior() {
        use std::collections::BTreeMap;
        use estimate_types::WorkflowStatus;

        struct AlwaysClosed;
        impl ActionHandler for AlwaysClosed {
            fn action(&self) -> ActionKind {
                ActionKind::UploadPhotos
            }
            fn allowed_actors(&self) -> &'static [ActorKind] {
                &[ActorKind::Customer]
            }
            fn allowed_params(&self) -> &'static [&'static str] {
                &[]
            }
            fn guard(
                &self,
                _record: &WorkflowRecord,
                _ctx: &ActionContext<'_>,
            ) -> EstimateResult<()> {
                Err(EstimateError::precondition(
                    ActionKind::UploadPhotos,
                    "uploads disabled",
                ))
            }
            fn apply(
                &self,
                _record: &mut WorkflowRecord,
                _ctx: &ActionContext<'_>,
            ) -> EstimateResult<()> {
                Ok(())
            }
            fn audit_metadata(
                &self,
                _before: &WorkflowRecord,
                _after: &WorkflowRecord,
                _ctx: &ActionContext<'_>,
            ) -> BTreeMap<String, String> {
                BTreeMap::new()
            }
        }

        let mut registry = ActionRegistry::standard();
        registry.register(Box::new(AlwaysClosed));
        let processor = ActionProcessor::new(registry, DEFAULT_MAX_DIFF_DEPTH);

        let mut record = WorkflowRecord::new();
        record.workflow.status = WorkflowStatus::Sent;
        record.quote.photos_required = estimate_types::PhotoRequirement::Required;

        let params = ActionParams::default();
        let pricing = FlatRatePricing::default();
        let err = processor
            .apply(
                &record,
                ActionKind::UploadPhotos,
                &ctx(ActorKind::Customer, &params, &pricing),
            )
            .unwrap_err();
        assert_eq!(err.class(), RejectionClass::Precondition);
    }
}
