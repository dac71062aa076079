//! Commercial identity-verification service.
//!
//! One conversation request per applicant. The response lists products and
//! per-item pass/fail signals; each failed item becomes a
//! `mismatch:<ItemName>` reason. In year-only DOB mode a failed
//! `DOBFullVerified` item is waived when `DOBYearVerified` passed, before
//! the verdict is derived.

use async_trait::async_trait;
use idproof_types::{ApplicantIdentity, OutcomeStatus, ReasonCode, VendorId, VendorOutcome};
use serde::{Deserialize, Serialize};

use crate::http::{build_client, send_json};
use crate::{DobComparison, IdentityServiceConfig, VendorAdapter, VendorConfig, VendorError};

const DOB_FULL_ITEM: &str = "DOBFullVerified";
const DOB_YEAR_ITEM: &str = "DOBYearVerified";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ConversationRequest<'a> {
    #[serde(rename = "Type")]
    kind: &'static str,
    settings: RequestSettings,
    person: Person<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RequestSettings {
    mode: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Person<'a> {
    name: PersonName<'a>,
    #[serde(rename = "SSN")]
    ssn: String,
    date_of_birth: BirthDate,
    addresses: [PersonAddress<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PersonName<'a> {
    first_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    middle_name: Option<&'a str>,
    last_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct BirthDate {
    year: u16,
    month: u8,
    day: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PersonAddress<'a> {
    street_address1: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    street_address2: Option<&'a str>,
    city: &'a str,
    state: &'a str,
    zip5: &'a str,
    context: &'static str,
}

impl<'a> ConversationRequest<'a> {
    fn new(identity: &'a ApplicantIdentity, config: &IdentityServiceConfig) -> Self {
        let address = &identity.address;
        Self {
            kind: "Initiate",
            settings: RequestSettings {
                mode: config.request_mode.as_str(),
            },
            person: Person {
                name: PersonName {
                    first_name: &identity.first_name,
                    middle_name: identity.middle_name.as_deref(),
                    last_name: &identity.last_name,
                },
                ssn: identity.ssn_digits(),
                date_of_birth: BirthDate {
                    year: identity.dob.year(),
                    month: identity.dob.month(),
                    day: identity.dob.day(),
                },
                addresses: [PersonAddress {
                    street_address1: &address.address1,
                    street_address2: address.address2.as_deref(),
                    city: &address.city,
                    state: &address.state,
                    zip5: address.zipcode.get(..5).unwrap_or(address.zipcode.as_str()),
                    context: "primary",
                }],
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConversationResponse {
    status: TransactionStatus,
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TransactionStatus {
    transaction_status: String,
    #[serde(default)]
    conversation_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Product {
    #[serde(default)]
    product_type: Option<String>,
    product_status: String,
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Item {
    item_name: String,
    item_status: String,
}

impl Item {
    fn passed(&self) -> bool {
        self.item_status.eq_ignore_ascii_case("pass")
    }
}

/// Adapter for the commercial identity-verification service.
pub struct IdentityServiceAdapter {
    http_client: reqwest::Client,
}

impl IdentityServiceAdapter {
    pub fn new() -> Self {
        Self {
            http_client: build_client(),
        }
    }

    async fn call(
        &self,
        identity: &ApplicantIdentity,
        config: &IdentityServiceConfig,
    ) -> Result<VendorOutcome, VendorError> {
        let request = self
            .http_client
            .post(config.conversation_url())
            .timeout(config.timeout)
            .basic_auth(&config.username, Some(config.password.expose()))
            .json(&ConversationRequest::new(identity, config));

        let response: ConversationResponse = send_json(request).await?;
        Ok(interpret(response, config.dob_comparison))
    }
}

impl Default for IdentityServiceAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive the outcome from the transaction verdict and the product and
/// item signals.
///
/// `passed` is a success only when no item failed. `failed` is a failure
/// unless every failed item was waived under year-only DOB comparison.
/// Any other transaction status is an error.
fn interpret(response: ConversationResponse, dob: DobComparison) -> VendorOutcome {
    let transaction_id = response.status.conversation_id;
    let transaction = response.status.transaction_status.to_ascii_lowercase();
    if transaction == "error" {
        return VendorOutcome::error(VendorId::IdentityService, ReasonCode::new("vendor_error"))
            .with_transaction_id(transaction_id);
    }

    let mut reasons = Vec::new();
    let mut failed = false;
    let mut waived = false;

    for product in &response.products {
        let year_passed = product
            .items
            .iter()
            .any(|item| item.item_name == DOB_YEAR_ITEM && item.passed());

        let mut unexplained = !product.product_status.eq_ignore_ascii_case("pass");
        for item in product.items.iter().filter(|item| !item.passed()) {
            unexplained = false;
            if dob == DobComparison::YearOnly && item.item_name == DOB_FULL_ITEM && year_passed {
                waived = true;
                reasons.push(ReasonCode::with_detail("waived", &item.item_name));
                continue;
            }
            failed = true;
            reasons.push(ReasonCode::with_detail(ReasonCode::MISMATCH, &item.item_name));
        }

        if unexplained {
            failed = true;
            reasons.push(ReasonCode::with_detail(
                "product_failed",
                product.product_type.as_deref().unwrap_or("unknown"),
            ));
        }
    }

    let status = match transaction.as_str() {
        "passed" if !failed => OutcomeStatus::Success,
        "passed" => OutcomeStatus::Failure,
        "failed" if !failed && waived => OutcomeStatus::Success,
        "failed" => {
            if !failed {
                reasons.push(ReasonCode::new("transaction_failed"));
            }
            OutcomeStatus::Failure
        }
        _ => {
            tracing::warn!(
                vendor = %VendorId::IdentityService,
                status = %response.status.transaction_status,
                "unexpected transaction status"
            );
            return VendorOutcome::error(
                VendorId::IdentityService,
                ReasonCode::with_detail(
                    "unexpected_transaction_status",
                    &response.status.transaction_status,
                ),
            )
            .with_transaction_id(transaction_id);
        }
    };
    VendorOutcome::new(VendorId::IdentityService, status)
        .with_reasons(reasons)
        .with_transaction_id(transaction_id)
}

#[async_trait]
impl VendorAdapter for IdentityServiceAdapter {
    fn vendor(&self) -> VendorId {
        VendorId::IdentityService
    }

    async fn verify(&self, identity: &ApplicantIdentity, config: &VendorConfig) -> VendorOutcome {
        let VendorConfig::IdentityService(config) = config else {
            return VendorError::ConfigMismatch(config.vendor())
                .into_outcome(VendorId::IdentityService);
        };

        match self.call(identity, config).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(vendor = %VendorId::IdentityService, error = %e, "vendor call failed");
                e.into_outcome(VendorId::IdentityService)
            }
        }
    }
}
