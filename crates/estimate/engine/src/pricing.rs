//! Pricing collaborator: fixes the invoice total at acceptance.

use estimate_types::WorkflowRecord;

/// Default flat rate, in minor units ($650.00).
pub const DEFAULT_QUOTE_TOTAL_MINOR: u64 = 65_000;

/// Prices the work a quote covers. The engine calls this exactly once
/// per acceptance, when the invoice is issued.
pub trait QuotePricing: Send + Sync {
    /// Total for the work described by the record, in minor units.
    fn quote_total_minor(&self, record: &WorkflowRecord) -> u64;
}

/// Flat-rate pricing: every accepted quote invoices the same amount.
#[derive(Clone, Copy, Debug)]
pub struct FlatRatePricing {
    total_minor: u64,
}

impl FlatRatePricing {
    pub fn new(total_minor: u64) -> Self {
        Self { total_minor }
    }
}

impl Default for FlatRatePricing {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTE_TOTAL_MINOR)
    }
}

impl QuotePricing for FlatRatePricing {
    fn quote_total_minor(&self, _record: &WorkflowRecord) -> u64 {
        self.total_minor
    }
}
