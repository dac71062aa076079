//! The aggregate resolution result stored behind a result handle.

use crate::{ProofingFlags, ReasonCode, ResultHandle, Timestamp, TraceId, VendorId, VendorOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate verdict for one verification attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// Every dispatched vendor confirmed the identity.
    Verified,
    /// At least one vendor positively reported a mismatch. Do not retry.
    NotVerified,
    /// The verdict is indeterminate. Retry or escalate.
    Error,
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::NotVerified => "not_verified",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vendor that was planned out of the run, and why.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedVendor {
    pub vendor: VendorId,
    pub reason: ReasonCode,
}

/// The terminal result of one run. Immutable once written to the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub handle: ResultHandle,
    pub trace_id: TraceId,
    pub status: ResolutionStatus,
    /// One entry per dispatched vendor.
    pub outcomes: Vec<VendorOutcome>,
    pub excluded: Vec<ExcludedVendor>,
    /// Run-level reasons (e.g. `no_vendors_selected`, `decryption_failed`).
    pub reasons: Vec<ReasonCode>,
    pub policy: ProofingFlags,
    pub completed_at: Timestamp,
}

impl ResolutionResult {
    /// A terminal `Error` result with no vendor outcomes.
    pub fn error(
        handle: ResultHandle,
        trace_id: TraceId,
        policy: ProofingFlags,
        reason: ReasonCode,
    ) -> Self {
        Self {
            handle,
            trace_id,
            status: ResolutionStatus::Error,
            outcomes: Vec::new(),
            excluded: Vec::new(),
            reasons: vec![reason],
            policy,
            completed_at: Timestamp::now(),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.status == ResolutionStatus::Verified
    }

    pub fn outcome_for(&self, vendor: VendorId) -> Option<&VendorOutcome> {
        self.outcomes.iter().find(|o| o.vendor == vendor)
    }
}
