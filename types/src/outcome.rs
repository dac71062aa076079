//! Per-vendor outcomes in the shared outcome vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An external verification source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorId {
    /// State motor-vehicle record verification.
    StateRecord,
    /// Commercial identity-verification service.
    IdentityService,
}

impl VendorId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StateRecord => "state_record",
            Self::IdentityService => "identity_service",
        }
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a single vendor call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Failure,
    Timeout,
    Error,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Timeout => "timeout",
            Self::Error => "error",
        }
    }

    /// Timeouts and errors say nothing about whether the identity matched.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, Self::Timeout | Self::Error)
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A machine-readable reason, `code` or `code:detail`.
///
/// Details carry vendor diagnostics (HTTP status, item names), never PII.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReasonCode(String);

impl ReasonCode {
    pub const DECRYPTION_FAILED: &'static str = "decryption_failed";
    pub const NO_VENDORS_SELECTED: &'static str = "no_vendors_selected";
    pub const DISPATCH_FAILED: &'static str = "dispatch_failed";
    pub const AGGREGATION_AMBIGUITY: &'static str = "aggregation_ambiguity";
    pub const STORE_FAILED: &'static str = "store_failed";
    pub const DEADLINE_EXCEEDED: &'static str = "deadline_exceeded";
    pub const MISMATCH: &'static str = "mismatch";
    pub const MISSING: &'static str = "missing";

    pub fn new(code: &str) -> Self {
        Self(code.to_string())
    }

    pub fn with_detail(code: &str, detail: impl fmt::Display) -> Self {
        Self(format!("{code}:{detail}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the first `:`.
    pub fn code(&self) -> &str {
        self.0.split(':').next().unwrap_or_default()
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The result of consulting one vendor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorOutcome {
    pub vendor: VendorId,
    pub status: OutcomeStatus,
    /// Match/mismatch and error reasons, in the order the vendor reported them.
    pub reasons: Vec<ReasonCode>,
    /// Vendor transaction id, kept for audit.
    pub transaction_id: Option<String>,
    /// Wall-clock time spent on the call, filled in by the dispatcher.
    pub elapsed_ms: u64,
}

impl VendorOutcome {
    pub fn new(vendor: VendorId, status: OutcomeStatus) -> Self {
        Self {
            vendor,
            status,
            reasons: Vec::new(),
            transaction_id: None,
            elapsed_ms: 0,
        }
    }

    pub fn success(vendor: VendorId) -> Self {
        Self::new(vendor, OutcomeStatus::Success)
    }

    pub fn failure(vendor: VendorId, reasons: Vec<ReasonCode>) -> Self {
        Self::new(vendor, OutcomeStatus::Failure).with_reasons(reasons)
    }

    pub fn timeout(vendor: VendorId, reason: ReasonCode) -> Self {
        Self::new(vendor, OutcomeStatus::Timeout).with_reasons(vec![reason])
    }

    pub fn error(vendor: VendorId, reason: ReasonCode) -> Self {
        Self::new(vendor, OutcomeStatus::Error).with_reasons(vec![reason])
    }

    pub fn with_reasons(mut self, reasons: Vec<ReasonCode>) -> Self {
        self.reasons = reasons;
        self
    }

    pub fn with_transaction_id(mut self, id: Option<String>) -> Self {
        self.transaction_id = id;
        self
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_code_splits_detail() {
        let r = ReasonCode::with_detail("http_status", 503);
        assert_eq!(r.as_str(), "http_status:503");
        assert_eq!(r.code(), "http_status");
        assert_eq!(ReasonCode::new("timeout").code(), "timeout");
    }

    #[test]
    fn vendor_ids_serialize_snake_case() {
        let json = serde_json::to_string(&VendorId::IdentityService).unwrap();
        assert_eq!(json, r#""identity_service""#);
        assert_eq!(VendorId::StateRecord.to_string(), "state_record");
    }
}
