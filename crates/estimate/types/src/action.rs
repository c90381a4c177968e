//! The canonical command vocabulary and the flat parameter record that
//! crosses the boundary with each command.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{EstimateError, EstimateResult};

/// Parameter keys associated with prototype-pollution attacks. Their
/// presence rejects the whole command as malformed input.
pub const FORBIDDEN_PARAM_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Every canonical action the command interface accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    RequestQuote,
    UploadPhotos,
    SubmitPhotos,
    RequestChanges,
    ApproveAndEnable,
    EnableAcceptance,
    TogglePhotosRequired,
    Accept,
    PayPartial,
    PayFull,
    Reject,
    Reset,
}

impl ActionKind {
    pub const ALL: [ActionKind; 12] = [
        Self::RequestQuote,
        Self::UploadPhotos,
        Self::SubmitPhotos,
        Self::RequestChanges,
        Self::ApproveAndEnable,
        Self::EnableAcceptance,
        Self::TogglePhotosRequired,
        Self::Accept,
        Self::PayPartial,
        Self::PayFull,
        Self::Reject,
        Self::Reset,
    ];

    /// Resolve a wire name. `request-review` is the historical alias for
    /// `submit-photos`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "request-quote" => Some(Self::RequestQuote),
            "upload-photos" => Some(Self::UploadPhotos),
            "submit-photos" | "request-review" => Some(Self::SubmitPhotos),
            "request-changes" => Some(Self::RequestChanges),
            "approve-and-enable" => Some(Self::ApproveAndEnable),
            "enable-acceptance" => Some(Self::EnableAcceptance),
            "toggle-photos-required" => Some(Self::TogglePhotosRequired),
            "accept" => Some(Self::Accept),
            "pay-partial" => Some(Self::PayPartial),
            "pay-full" => Some(Self::PayFull),
            "reject" => Some(Self::Reject),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestQuote => "request-quote",
            Self::UploadPhotos => "upload-photos",
            Self::SubmitPhotos => "submit-photos",
            Self::RequestChanges => "request-changes",
            Self::ApproveAndEnable => "approve-and-enable",
            Self::EnableAcceptance => "enable-acceptance",
            Self::TogglePhotosRequired => "toggle-photos-required",
            Self::Accept => "accept",
            Self::PayPartial => "pay-partial",
            Self::PayFull => "pay-full",
            Self::Reject => "reject",
            Self::Reset => "reset",
        }
    }

    /// Human label for the event log.
    pub fn label(&self) -> &'static str {
        match self {
            Self::RequestQuote => "Requested quote",
            Self::UploadPhotos => "Uploaded photo",
            Self::SubmitPhotos => "Submitted photos for review",
            Self::RequestChanges => "Requested changes",
            Self::ApproveAndEnable => "Approved photos and enabled acceptance",
            Self::EnableAcceptance => "Enabled acceptance",
            Self::TogglePhotosRequired => "Changed photo requirement",
            Self::Accept => "Accepted quote",
            Self::PayPartial => "Recorded partial payment",
            Self::PayFull => "Recorded final payment",
            Self::Reject => "Rejected quote",
            Self::Reset => "Reset workflow",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ── Parameters ──────────────────────────────────────────────────────────

/// Flat, allow-listed key/value parameters attached to a command. Built
/// only through [`ActionParams::sanitized`], so a handler never sees a
/// key it did not ask for.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionParams(BTreeMap<String, Value>);

impl ActionParams {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sanitize raw caller input against an allow-list. Forbidden keys
    /// reject the whole command; unrecognized keys are dropped (returned
    /// for diagnostics), never merged; nested values are refused because
    /// params are a flat record by contract.
    pub fn sanitized(
        raw: &serde_json::Map<String, Value>,
        allowed: &[&str],
    ) -> EstimateResult<(Self, Vec<String>)> {
        let mut kept = BTreeMap::new();
        let mut dropped = Vec::new();
        for (key, value) in raw {
            if FORBIDDEN_PARAM_KEYS.contains(&key.as_str()) {
                return Err(EstimateError::ForbiddenParamKey(key.clone()));
            }
            if !allowed.contains(&key.as_str()) {
                dropped.push(key.clone());
                continue;
            }
            if value.is_object() || value.is_array() {
                return Err(EstimateError::MalformedParam {
                    key: key.clone(),
                    expected: "scalar value",
                });
            }
            kept.insert(key.clone(), value.clone());
        }
        Ok((Self(kept), dropped))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The sanitized params as a JSON object, for request bodies.
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone().into_iter().collect())
    }

    /// Optional string param. Present-but-not-a-string is malformed.
    pub fn opt_str(&self, key: &str) -> EstimateResult<Option<&str>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(EstimateError::MalformedParam {
                key: key.to_string(),
                expected: "string",
            }),
        }
    }

    /// Optional non-negative integer param.
    pub fn opt_u64(&self, key: &str) -> EstimateResult<Option<u64>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(value) => {
                value
                    .as_u64()
                    .map(Some)
                    .ok_or_else(|| EstimateError::MalformedParam {
                        key: key.to_string(),
                        expected: "non-negative integer",
                    })
            }
        }
    }

    /// Required non-negative integer param.
    pub fn require_u64(&self, key: &str) -> EstimateResult<u64> {
        self.opt_u64(key)?.ok_or_else(|| EstimateError::MalformedParam {
            key: key.to_string(),
            expected: "non-negative integer",
        })
    }

    /// Required boolean param.
    pub fn require_bool(&self, key: &str) -> EstimateResult<bool> {
        match self.0.get(key) {
            Some(Value::Bool(b)) => Ok(*b),
            _ => Err(EstimateError::MalformedParam {
                key: key.to_string(),
                expected: "boolean",
            }),
        }
    }
}
