//! The identity-resolution proofing pipeline.
//!
//! A run takes one [`ProofingJob`] through
//! `Start → Decrypted → VendorsDispatched → Aggregated → Stored → Notified → Done`
//! (or `Failed`), see [`RunState`]:
//!
//! 1. decrypt the applicant payload ([`idproof_crypto::PayloadDecryptor`]),
//! 2. plan the vendors for this run ([`VendorConfigResolver`]),
//! 3. call every planned vendor concurrently, each under its own deadline,
//! 4. merge the outcomes ([`aggregate`]),
//! 5. write the result behind its handle, then notify the caller once.

pub mod aggregator;
pub mod error;
pub mod in_flight;
pub mod job;
pub mod metrics;
pub mod orchestrator;
pub mod resolver;
pub mod settings;
pub mod state;

pub use aggregator::{aggregate, Verdict};
pub use error::{ProofingError, SettingsError};
pub use in_flight::{InFlightGuard, InFlightRegistry};
pub use job::ProofingJob;
pub use metrics::ProofingMetrics;
pub use orchestrator::{ProofingOrchestrator, RunReport};
pub use resolver::{VendorConfigResolver, VendorPlan};
pub use settings::{IdentityServiceSettings, ProofingSettings, StateRecordSettings};
pub use state::RunState;
