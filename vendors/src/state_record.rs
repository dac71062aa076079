//! State motor-vehicle record verification.
//!
//! Certificate mode: sign a handshake, POST it to `auth_url`, and present
//! the returned token as a bearer credential on the verification call.
//! Unauthenticated mode: POST the verification request directly.
//!
//! The vendor answers with a per-attribute match map. Required attributes
//! must all match; other mismatches are kept as audit reasons.

use async_trait::async_trait;
use idproof_crypto::sign_handshake;
use idproof_types::{
    ApplicantIdentity, OutcomeStatus, ReasonCode, StateIdDetails, Timestamp, VendorId,
    VendorOutcome,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::http::{build_client, send_json};
use crate::{CertificateAuth, StateRecordAuth, StateRecordConfig, VendorAdapter, VendorConfig, VendorError};

/// Attributes that must be confirmed for a `Success` verdict.
pub const REQUIRED_ATTRIBUTES: [&str; 4] = ["state_id_number", "dob", "last_name", "first_name"];

#[derive(Serialize)]
struct VerificationRequest<'a> {
    state_id_number: &'a str,
    state_id_jurisdiction: &'a str,
    state_id_type: &'a str,
    first_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    middle_name: Option<&'a str>,
    last_name: &'a str,
    dob: String,
    address1: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    address2: Option<&'a str>,
    city: &'a str,
    state: &'a str,
    zipcode: &'a str,
}

impl<'a> VerificationRequest<'a> {
    fn new(identity: &'a ApplicantIdentity, state_id: &'a StateIdDetails) -> Self {
        Self {
            state_id_number: &state_id.number,
            state_id_jurisdiction: &state_id.jurisdiction,
            state_id_type: &state_id.id_type,
            first_name: &identity.first_name,
            middle_name: identity.middle_name.as_deref(),
            last_name: &identity.last_name,
            dob: identity.dob.to_string(),
            address1: &identity.address.address1,
            address2: identity.address.address2.as_deref(),
            city: &identity.address.city,
            state: &identity.address.state,
            zipcode: &identity.address.zipcode,
        }
    }
}

#[derive(Deserialize)]
struct AuthResponse {
    token: String,
}

#[derive(Deserialize)]
struct VerificationResponse {
    #[serde(default)]
    transaction_id: Option<String>,
    verification_results: BTreeMap<String, Option<bool>>,
}

/// Adapter for the state-record verification vendor.
pub struct StateRecordAdapter {
    http_client: reqwest::Client,
}

impl StateRecordAdapter {
    pub fn new() -> Self {
        Self {
            http_client: build_client(),
        }
    }

    async fn authenticate(&self, auth: &CertificateAuth) -> Result<String, VendorError> {
        let proof = sign_handshake(&auth.signing_key, Some(&auth.public_key), Timestamp::now())
            .map_err(|e| VendorError::Handshake(e.to_string()))?;

        let request = self
            .http_client
            .post(&auth.auth_url)
            .timeout(auth.timeout)
            .json(&proof);
        let response: AuthResponse = send_json(request).await?;
        if response.token.is_empty() {
            return Err(VendorError::Handshake("empty token".into()));
        }
        tracing::debug!(vendor = %VendorId::StateRecord, "certificate handshake complete");
        Ok(response.token)
    }

    async fn call(
        &self,
        identity: &ApplicantIdentity,
        config: &StateRecordConfig,
    ) -> Result<VendorOutcome, VendorError> {
        let Some(state_id) = identity.state_id.as_ref() else {
            return Ok(VendorOutcome::failure(
                VendorId::StateRecord,
                vec![ReasonCode::new("state_id_missing")],
            ));
        };

        let token = match &config.auth {
            StateRecordAuth::Certificate(auth) => Some(self.authenticate(auth).await?),
            StateRecordAuth::Unauthenticated => None,
        };

        let mut request = self
            .http_client
            .post(&config.verification_url)
            .timeout(config.timeout)
            .json(&VerificationRequest::new(identity, state_id));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response: VerificationResponse = send_json(request).await?;
        Ok(interpret(response))
    }
}

impl Default for StateRecordAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn the per-attribute match map into an outcome.
fn interpret(response: VerificationResponse) -> VendorOutcome {
    let mut reasons = Vec::new();
    let mut required_failed = false;

    for attribute in REQUIRED_ATTRIBUTES {
        match response.verification_results.get(attribute) {
            Some(Some(true)) => {}
            Some(Some(false)) => {
                required_failed = true;
                reasons.push(ReasonCode::with_detail(ReasonCode::MISMATCH, attribute));
            }
            Some(None) | None => {
                required_failed = true;
                reasons.push(ReasonCode::with_detail(ReasonCode::MISSING, attribute));
            }
        }
    }
    for (attribute, matched) in &response.verification_results {
        if REQUIRED_ATTRIBUTES.contains(&attribute.as_str()) {
            continue;
        }
        match matched {
            Some(true) => {}
            Some(false) => reasons.push(ReasonCode::with_detail(ReasonCode::MISMATCH, attribute)),
            None => reasons.push(ReasonCode::with_detail(ReasonCode::MISSING, attribute)),
        }
    }

    let status = if required_failed {
        OutcomeStatus::Failure
    } else {
        OutcomeStatus::Success
    };
    VendorOutcome::new(VendorId::StateRecord, status)
        .with_reasons(reasons)
        .with_transaction_id(response.transaction_id)
}

#[async_trait]
impl VendorAdapter for StateRecordAdapter {
    fn vendor(&self) -> VendorId {
        VendorId::StateRecord
    }

    async fn verify(&self, identity: &ApplicantIdentity, config: &VendorConfig) -> VendorOutcome {
        let VendorConfig::StateRecord(config) = config else {
            return VendorError::ConfigMismatch(config.vendor()).into_outcome(VendorId::StateRecord);
        };

        match self.call(identity, config).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    vendor = %VendorId::StateRecord,
                    certificate = config.auth.is_certificate(),
                    error = %e,
                    "vendor call failed"
                );
                e.into_outcome(VendorId::StateRecord)
            }
        }
    }
}
