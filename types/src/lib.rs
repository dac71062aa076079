//! Fundamental types for the idproof resolution-proofing pipeline.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! the applicant identity payload, run parameters, per-vendor outcomes, the
//! aggregate resolution result, timestamps and redacted secrets.

pub mod error;
pub mod identity;
pub mod outcome;
pub mod params;
pub mod result;
pub mod secret;
pub mod time;

pub use error::TypeError;
pub use identity::{Address, ApplicantIdentity, DateOfBirth, StateIdDetails};
pub use outcome::{OutcomeStatus, ReasonCode, VendorId, VendorOutcome};
pub use params::{CallbackTarget, ProofingFlags, ResultHandle, RunParameters, TraceId};
pub use result::{ExcludedVendor, ResolutionResult, ResolutionStatus};
pub use secret::Secret;
pub use time::Timestamp;
