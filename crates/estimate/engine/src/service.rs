//! Stateful service facade over one estimate's workflow.
//!
//! Owns the current record, the action processor, and the two bounded
//! journals. `dispatch` is the single entry point for commands: it
//! sanitizes parameters, validates identifier shapes, runs the action
//! through the processor, and commits record plus journal entries
//! together. A rejected command leaves every one of those untouched.

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use estimate_types::{
    ActionKind, ActionParams, ActorKind, DisplayStatus, EstimateError, EstimateId, EstimateResult,
    LocationId, RejectionClass, StateDelta, WorkflowRecord,
};

use crate::differ::DEFAULT_MAX_DIFF_DEPTH;
use crate::handlers::{ActionContext, UNIVERSAL_PARAM_KEYS};
use crate::journal::{ApiCallRecord, ApiMethod, BoundedLog, EventLogEntry, DEFAULT_LOG_CAPACITY};
use crate::permissions::{compute_permissions, PermissionSet};
use crate::pricing::{FlatRatePricing, QuotePricing};
use crate::processor::{ActionProcessor, ActionRegistry};
use crate::resolver::resolve_display_status;

/// Construction-time settings for a [`WorkflowService`].
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// The estimate this service instance manages.
    pub estimate_id: EstimateId,
    /// Job site the estimate is for, when known up front.
    pub location_id: Option<LocationId>,
    /// Ring capacity of the event log.
    pub event_log_capacity: usize,
    /// Ring capacity of the API call trace.
    pub api_log_capacity: usize,
    /// Recursion bound for the state differ.
    pub max_diff_depth: usize,
    /// Base URL baked into customer portal invites.
    pub portal_base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            estimate_id: EstimateId::generate(),
            location_id: None,
            event_log_capacity: DEFAULT_LOG_CAPACITY,
            api_log_capacity: DEFAULT_LOG_CAPACITY,
            max_diff_depth: DEFAULT_MAX_DIFF_DEPTH,
            portal_base_url: "https://portal.quotedesk.example".to_string(),
        }
    }
}

/// What a caller gets back from a committed dispatch.
#[derive(Clone, Debug)]
pub struct DispatchReceipt {
    pub action: ActionKind,
    pub display_status: DisplayStatus,
    pub permissions: PermissionSet,
    pub delta: StateDelta,
    pub audit_id: Uuid,
    pub version: u64,
}

/// One estimate's workflow: record, processor, and journals.
pub struct WorkflowService {
    config: ServiceConfig,
    record: WorkflowRecord,
    processor: ActionProcessor,
    pricing: Box<dyn QuotePricing>,
    events: BoundedLog<EventLogEntry>,
    api_calls: BoundedLog<ApiCallRecord>,
}

impl WorkflowService {
    /// Service with flat-rate pricing.
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_pricing(config, Box::new(FlatRatePricing::default()))
    }

    pub fn with_pricing(config: ServiceConfig, pricing: Box<dyn QuotePricing>) -> Self {
        let processor = ActionProcessor::new(ActionRegistry::standard(), config.max_diff_depth);
        let events = BoundedLog::new(config.event_log_capacity);
        let api_calls = BoundedLog::new(config.api_log_capacity);
        info!(estimate_id = %config.estimate_id, "workflow service initialized");
        Self {
            config,
            record: WorkflowRecord::new(),
            processor,
            pricing,
            events,
            api_calls,
        }
    }

    // ── Reads ───────────────────────────────────────────────────────────

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn estimate_id(&self) -> &EstimateId {
        &self.config.estimate_id
    }

    pub fn record(&self) -> &WorkflowRecord {
        &self.record
    }

    pub fn version(&self) -> u64 {
        self.record.version
    }

    /// Single display status derived from the current record.
    pub fn display_status(&self) -> DisplayStatus {
        resolve_display_status(&self.record)
    }

    /// Permission flags derived from the current record.
    pub fn permissions(&self) -> PermissionSet {
        compute_permissions(&self.record)
    }

    /// Event log, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &EventLogEntry> {
        self.events.iter()
    }

    /// API call trace, oldest first.
    pub fn api_calls(&self) -> impl Iterator<Item = &ApiCallRecord> {
        self.api_calls.iter()
    }

    // ── Commands ────────────────────────────────────────────────────────

    /// Run one command end to end. `raw_params` must be a JSON object
    /// (or null for none); unrecognized keys are dropped before the
    /// handler runs. On rejection the record, version, and journals are
    /// exactly as they were.
    pub fn dispatch(
        &mut self,
        action_name: &str,
        actor: ActorKind,
        raw_params: Value,
    ) -> EstimateResult<DispatchReceipt> {
        match self.try_dispatch(action_name, actor, raw_params) {
            Ok(receipt) => {
                info!(
                    action = %receipt.action,
                    actor = %actor,
                    version = receipt.version,
                    status = receipt.display_status.label(),
                    changed = receipt.delta.len(),
                    "action committed"
                );
                Ok(receipt)
            }
            Err(err) => {
                match err.class() {
                    RejectionClass::Precondition => {
                        debug!(action = action_name, actor = %actor, reason = %err, "action not available")
                    }
                    RejectionClass::MalformedInput => {
                        warn!(action = action_name, actor = %actor, reason = %err, "malformed command rejected")
                    }
                    RejectionClass::InvariantViolation => {
                        error!(action = action_name, actor = %actor, reason = %err, "transition rejected by invariant check")
                    }
                }
                Err(err)
            }
        }
    }

    fn try_dispatch(
        &mut self,
        action_name: &str,
        actor: ActorKind,
        raw_params: Value,
    ) -> EstimateResult<DispatchReceipt> {
        let kind = ActionKind::parse(action_name)
            .ok_or_else(|| EstimateError::UnknownAction(action_name.to_string()))?;
        let handler = self
            .processor
            .handler(kind)
            .ok_or_else(|| EstimateError::UnknownAction(action_name.to_string()))?;

        let raw_map = match raw_params {
            Value::Null => serde_json::Map::new(),
            Value::Object(map) => map,
            _ => {
                return Err(EstimateError::MalformedParam {
                    key: "params".to_string(),
                    expected: "JSON object",
                })
            }
        };

        let mut allowed: Vec<&str> = handler.allowed_params().to_vec();
        allowed.extend(UNIVERSAL_PARAM_KEYS);
        let (params, dropped) = ActionParams::sanitized(&raw_map, &allowed)?;
        if !dropped.is_empty() {
            debug!(action = %kind, keys = ?dropped, "dropped params outside the allow list");
        }

        self.validate_identifiers(kind, &params)?;

        let now = Utc::now();
        let ctx = ActionContext {
            actor,
            params: &params,
            now,
            pricing: self.pricing.as_ref(),
            portal_base_url: &self.config.portal_base_url,
        };
        let outcome = self.processor.apply(&self.record, kind, &ctx)?;

        self.record = outcome.record;
        let display_status = resolve_display_status(&self.record);
        let permissions = compute_permissions(&self.record);

        self.events.push(EventLogEntry {
            timestamp: now,
            actor,
            action_label: kind.label().to_string(),
            delta: outcome.delta.clone(),
            audit_id: outcome.audit.id,
            details: render_details(&outcome.audit.metadata),
        });

        let (method, endpoint) = self.api_route(kind);
        let mut response_body = json!({
            "ok": true,
            "display_status": display_status,
            "version": self.record.version,
        });
        if let Some(invoice) = &self.record.invoice {
            response_body["balance_minor"] = json!(invoice.balance_minor());
        }
        self.api_calls.push(ApiCallRecord {
            timestamp: now,
            method,
            endpoint,
            request_body: params.to_json(),
            response_body,
            duration_ms: simulated_latency_ms(kind),
        });

        Ok(DispatchReceipt {
            action: kind,
            display_status,
            permissions,
            delta: outcome.delta,
            audit_id: outcome.audit.id,
            version: self.record.version,
        })
    }

    /// Shape-check identifier params and pin them to this service's
    /// estimate and location.
    fn validate_identifiers(&self, kind: ActionKind, params: &ActionParams) -> EstimateResult<()> {
        if let Some(raw) = params.opt_str("estimate_id")? {
            let id = EstimateId::parse(raw)?;
            if id != self.config.estimate_id {
                return Err(EstimateError::precondition(
                    kind,
                    "command targets a different estimate",
                ));
            }
        }
        if let Some(raw) = params.opt_str("location_id")? {
            let id = LocationId::parse(raw)?;
            if let Some(expected) = &self.config.location_id {
                if id != *expected {
                    return Err(EstimateError::precondition(
                        kind,
                        "command targets a different location",
                    ));
                }
            }
        }
        Ok(())
    }

    /// The backend route a committed action would have hit. Payment
    /// routes address the invoice, everything else the estimate.
    fn api_route(&self, kind: ActionKind) -> (ApiMethod, String) {
        let eid = &self.config.estimate_id;
        match kind {
            ActionKind::RequestQuote => (ApiMethod::Post, format!("/api/estimates/{eid}/quote")),
            ActionKind::UploadPhotos => (ApiMethod::Post, format!("/api/estimates/{eid}/photos")),
            ActionKind::SubmitPhotos => {
                (ApiMethod::Post, format!("/api/estimates/{eid}/photos/submit"))
            }
            ActionKind::RequestChanges => (
                ApiMethod::Post,
                format!("/api/estimates/{eid}/review/request-changes"),
            ),
            ActionKind::ApproveAndEnable => {
                (ApiMethod::Post, format!("/api/estimates/{eid}/review/approve"))
            }
            ActionKind::EnableAcceptance => {
                (ApiMethod::Post, format!("/api/estimates/{eid}/acceptance"))
            }
            ActionKind::TogglePhotosRequired => {
                (ApiMethod::Patch, format!("/api/estimates/{eid}"))
            }
            ActionKind::Accept => (ApiMethod::Post, format!("/api/estimates/{eid}/accept")),
            ActionKind::PayPartial | ActionKind::PayFull => {
                let invoice = self
                    .record
                    .invoice
                    .as_ref()
                    .map(|invoice| invoice.id.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                (ApiMethod::Post, format!("/api/invoices/{invoice}/payments"))
            }
            ActionKind::Reject => (ApiMethod::Post, format!("/api/estimates/{eid}/reject")),
            ActionKind::Reset => (ApiMethod::Delete, format!("/api/estimates/{eid}")),
        }
    }
}

fn render_details(metadata: &std::collections::BTreeMap<String, String>) -> String {
    metadata
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stand-in latency for the simulated backend, fixed per action so
/// traces are reproducible.
fn simulated_latency_ms(kind: ActionKind) -> u64 {
    match kind {
        ActionKind::RequestQuote => 120,
        ActionKind::UploadPhotos => 85,
        ActionKind::SubmitPhotos => 60,
        ActionKind::RequestChanges => 45,
        ActionKind::ApproveAndEnable => 55,
        ActionKind::EnableAcceptance => 40,
        ActionKind::TogglePhotosRequired => 35,
        ActionKind::Accept => 150,
        ActionKind::PayPartial | ActionKind::PayFull => 220,
        ActionKind::Reject => 50,
        ActionKind::Reset => 30,
    }
}
