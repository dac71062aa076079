use idproof_store::StoreError;
use idproof_types::{ResultHandle, VendorId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProofingError {
    /// Another run for this handle has not finished yet.
    #[error("a run for result {0} is already in flight")]
    DuplicateInFlight(ResultHandle),

    #[error("result store error: {0}")]
    Store(#[from] StoreError),

    /// More than one outcome for the same vendor reached the aggregator.
    #[error("ambiguous aggregation: several outcomes for vendor {0}")]
    AggregationAmbiguity(VendorId),

    #[error("run cancelled")]
    Cancelled,

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Process-wide settings that cannot produce a valid vendor config.
/// Raised at startup, never per run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{vendor}: missing mandatory setting `{field}`")]
    Missing {
        vendor: VendorId,
        field: &'static str,
    },

    #[error("{vendor}: `{field}` must be greater than zero")]
    ZeroTimeout {
        vendor: VendorId,
        field: &'static str,
    },

    #[error("{vendor}: invalid key material: {reason}")]
    InvalidKey { vendor: VendorId, reason: String },
}
