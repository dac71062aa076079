//! Result Aggregator: merges per-vendor outcomes into one verdict.
//!
//! Precedence, highest first:
//! - no outcomes → `Error` with `no_vendors_selected`
//! - any `Failure` → `NotVerified` (a confirmed non-match stays a non-match)
//! - any `Timeout` / `Error` → `Error` (indeterminate, caller may retry)
//! - otherwise → `Verified`
//!
//! Vendor reason codes stay on the individual outcomes; the verdict only
//! carries run-level reasons.

use idproof_types::{OutcomeStatus, ReasonCode, ResolutionStatus, VendorOutcome};
use std::collections::HashSet;

use crate::ProofingError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub status: ResolutionStatus,
    pub reasons: Vec<ReasonCode>,
}

pub fn aggregate(outcomes: &[VendorOutcome]) -> Result<Verdict, ProofingError> {
    let mut seen = HashSet::new();
    for outcome in outcomes {
        if !seen.insert(outcome.vendor) {
            return Err(ProofingError::AggregationAmbiguity(outcome.vendor));
        }
    }

    if outcomes.is_empty() {
        return Ok(Verdict {
            status: ResolutionStatus::Error,
            reasons: vec![ReasonCode::new(ReasonCode::NO_VENDORS_SELECTED)],
        });
    }

    let status = if outcomes.iter().any(|o| o.status == OutcomeStatus::Failure) {
        ResolutionStatus::NotVerified
    } else if outcomes.iter().any(|o| o.status.is_indeterminate()) {
        ResolutionStatus::Error
    } else {
        ResolutionStatus::Verified
    };

    Ok(Verdict {
        status,
        reasons: Vec::new(),
    })
}
