//! Vendor adapters for the idproof pipeline.
//!
//! Each external verification source is reached through a
//! [`VendorAdapter`], which maps the vendor's protocol, authentication and
//! failure modes onto the shared [`VendorOutcome`] vocabulary. Adapters
//! never return an error past their boundary: transport failures, bad
//! statuses and unparseable bodies all become `Error` or `Timeout`
//! outcomes.
//!
//! Adapters hold only a reusable HTTP client. Endpoints, credentials and
//! policy arrive per call in an immutable [`VendorConfig`].

pub mod config;
pub mod error;
pub mod http;
pub mod identity_service;
pub mod state_record;

pub use config::{
    CertificateAuth, DobComparison, IdentityServiceConfig, RequestMode, StateRecordAuth,
    StateRecordConfig, VendorConfig,
};
pub use error::VendorError;
pub use identity_service::IdentityServiceAdapter;
pub use state_record::StateRecordAdapter;

use async_trait::async_trait;
use idproof_types::{ApplicantIdentity, VendorId, VendorOutcome};

/// Common request/response contract of every vendor.
#[async_trait]
pub trait VendorAdapter: Send + Sync {
    fn vendor(&self) -> VendorId;

    /// Verify `identity` against this vendor. Always yields an outcome.
    async fn verify(&self, identity: &ApplicantIdentity, config: &VendorConfig) -> VendorOutcome;
}
