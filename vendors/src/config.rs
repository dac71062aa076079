//! Per-run vendor configuration.
//!
//! Built fresh for every run from process-wide settings, so rotated
//! credentials are picked up without a restart. Values are immutable once
//! built and owned by the run.

use idproof_types::{Secret, VendorId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one vendor in one run.
#[derive(Clone, Debug)]
pub enum VendorConfig {
    StateRecord(StateRecordConfig),
    IdentityService(IdentityServiceConfig),
}

impl VendorConfig {
    pub fn vendor(&self) -> VendorId {
        match self {
            Self::StateRecord(_) => VendorId::StateRecord,
            Self::IdentityService(_) => VendorId::IdentityService,
        }
    }

    /// Upper bound on the whole vendor call: the sum of every request
    /// timeout the call may incur.
    pub fn deadline(&self) -> Duration {
        match self {
            Self::StateRecord(c) => match &c.auth {
                StateRecordAuth::Certificate(auth) => c.timeout + auth.timeout,
                StateRecordAuth::Unauthenticated => c.timeout,
            },
            Self::IdentityService(c) => c.timeout,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StateRecordConfig {
    pub verification_url: String,
    pub timeout: Duration,
    pub auth: StateRecordAuth,
}

/// How the state-record vendor authenticates us.
#[derive(Clone, Debug)]
pub enum StateRecordAuth {
    /// Signed handshake against `auth_url` before verification.
    Certificate(CertificateAuth),
    /// Verification request sent directly.
    Unauthenticated,
}

impl StateRecordAuth {
    pub fn is_certificate(&self) -> bool {
        matches!(self, Self::Certificate(_))
    }
}

#[derive(Clone, Debug)]
pub struct CertificateAuth {
    pub auth_url: String,
    pub timeout: Duration,
    /// Hex Ed25519 seed.
    pub signing_key: Secret,
    /// Hex Ed25519 public key registered with the vendor.
    pub public_key: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    #[default]
    Live,
    Testing,
}

impl RequestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Testing => "testing",
        }
    }
}

/// How birth dates are compared against vendor records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DobComparison {
    #[default]
    Full,
    YearOnly,
}

#[derive(Clone, Debug)]
pub struct IdentityServiceConfig {
    pub base_url: String,
    pub account_id: String,
    pub username: String,
    pub password: Secret,
    pub workflow: String,
    pub request_mode: RequestMode,
    pub timeout: Duration,
    pub dob_comparison: DobComparison,
}

impl IdentityServiceConfig {
    pub fn conversation_url(&self) -> String {
        format!(
            "{}/restws/identity/v2/{}/{}/conversation",
            self.base_url.trim_end_matches('/'),
            self.account_id,
            self.workflow
        )
    }
}
