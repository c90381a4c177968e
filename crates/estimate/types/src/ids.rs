//! Identifier newtypes crossing the command boundary.
//!
//! Estimate and location ids are bounded alphanumeric-with-hyphen strings;
//! invoice ids additionally carry the `INV-` prefix. Shape validation lives
//! here so the dispatcher can reject malformed identifiers before any guard
//! runs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EstimateError, EstimateResult};

/// Upper bound on identifier length at the boundary.
pub const MAX_ID_LEN: usize = 64;

/// Recognizable prefix every invoice id must carry.
pub const INVOICE_ID_PREFIX: &str = "INV-";

fn valid_id_body(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_ID_LEN
        && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Eight-character uppercase token for synthesized identifiers and
/// document numbers.
pub fn short_token() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

// ── Estimate ────────────────────────────────────────────────────────────

/// Unique identifier for one customer estimate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EstimateId(pub String);

impl EstimateId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(format!("EST-{}", short_token()))
    }

    /// Validate an externally supplied id against the shape rules.
    pub fn parse(raw: &str) -> EstimateResult<Self> {
        if valid_id_body(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(EstimateError::MalformedIdentifier {
                kind: "estimate",
                value: raw.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EstimateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Location ────────────────────────────────────────────────────────────

/// Identifier of the job site a quote is for. Supplied by the caller,
/// never synthesized here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationId(pub String);

impl LocationId {
    /// Validate an externally supplied id against the shape rules.
    pub fn parse(raw: &str) -> EstimateResult<Self> {
        if valid_id_body(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(EstimateError::MalformedIdentifier {
                kind: "location",
                value: raw.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Invoice ─────────────────────────────────────────────────────────────

/// Unique identifier for an invoice. Always prefixed so an invoice id can
/// never be mistaken for an estimate id in a request path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvoiceId(pub String);

impl InvoiceId {
    /// Generate a fresh random id, prefix included.
    pub fn generate() -> Self {
        Self(format!("{}{}", INVOICE_ID_PREFIX, short_token()))
    }

    /// Validate an externally supplied id: prefix plus a bounded
    /// alphanumeric-with-hyphen body.
    pub fn parse(raw: &str) -> EstimateResult<Self> {
        match raw.strip_prefix(INVOICE_ID_PREFIX) {
            Some(body) if valid_id_body(body) => Ok(Self(raw.to_string())),
            _ => Err(EstimateError::MalformedIdentifier {
                kind: "invoice",
                value: raw.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Photo ───────────────────────────────────────────────────────────────

/// Identifier for one uploaded photo. Internal only, never validated at
/// the boundary.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhotoId(pub String);

impl PhotoId {
    pub fn generate() -> Self {
        Self(format!("PH-{}", short_token()))
    }
}

impl std::fmt::Display for PhotoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
