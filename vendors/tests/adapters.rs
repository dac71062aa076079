//! Adapters against in-process vendor stand-ins.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use idproof_crypto::{public_key_hex, verify_handshake, HandshakeProof};
use idproof_types::{
    Address, ApplicantIdentity, OutcomeStatus, ReasonCode, Secret, StateIdDetails,
};
use idproof_vendors::{
    CertificateAuth, DobComparison, IdentityServiceAdapter, IdentityServiceConfig, RequestMode,
    StateRecordAdapter, StateRecordAuth, StateRecordConfig, VendorAdapter, VendorConfig,
};

// ---------------------------------------------------------------------------
// Vendor stand-in
// ---------------------------------------------------------------------------

const TOKEN: &str = "tok-1";
const ACCOUNT: &str = "12345";
const WORKFLOW: &str = "instant.verify";

#[derive(Clone)]
struct Mock {
    status: StatusCode,
    /// `None` answers with a non-JSON body.
    body: Option<Value>,
    delay: Duration,
    auth_calls: Arc<AtomicUsize>,
    verify_calls: Arc<AtomicUsize>,
    authorization: Arc<Mutex<Option<String>>>,
    received: Arc<Mutex<Option<Value>>>,
}

impl Mock {
    fn new(status: StatusCode, body: Option<Value>) -> Self {
        Self {
            status,
            body,
            delay: Duration::ZERO,
            auth_calls: Arc::default(),
            verify_calls: Arc::default(),
            authorization: Arc::default(),
            received: Arc::default(),
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

async fn auth(State(mock): State<Mock>, Json(proof): Json<HandshakeProof>) -> Response {
    mock.auth_calls.fetch_add(1, Ordering::SeqCst);
    if verify_handshake(&proof) {
        Json(json!({ "token": TOKEN })).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn verify(State(mock): State<Mock>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.verify_calls.fetch_add(1, Ordering::SeqCst);
    *mock.authorization.lock().unwrap() = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    *mock.received.lock().unwrap() = Some(body);
    tokio::time::sleep(mock.delay).await;
    match mock.body {
        Some(body) => (mock.status, Json(body)).into_response(),
        None => (mock.status, "<html>upstream error</html>").into_response(),
    }
}

async fn spawn(mock: Mock) -> String {
    let conversation = format!("/restws/identity/v2/{ACCOUNT}/{WORKFLOW}/conversation");
    let app = Router::new()
        .route("/auth", post(auth))
        .route("/verify", post(verify))
        .route(&conversation, post(verify))
        .with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn applicant() -> ApplicantIdentity {
    ApplicantIdentity {
        first_name: "FAKEY".into(),
        middle_name: None,
        last_name: "MCFAKERSON".into(),
        dob: "1938-10-06".parse().unwrap(),
        ssn: "900-12-3456".into(),
        address: Address {
            address1: "1 FAKE RD".into(),
            address2: None,
            city: "GREAT FALLS".into(),
            state: "MT".into(),
            zipcode: "59010-4321".into(),
        },
        state_id: Some(StateIdDetails {
            number: "1111111111111".into(),
            jurisdiction: "ND".into(),
            id_type: "drivers_license".into(),
        }),
    }
}

fn signing_seed() -> Secret {
    Secret::new("07".repeat(32))
}

fn state_record_config(base: &str, auth: StateRecordAuth, timeout: Duration) -> VendorConfig {
    VendorConfig::StateRecord(StateRecordConfig {
        verification_url: format!("{base}/verify"),
        timeout,
        auth,
    })
}

fn certificate(base: &str) -> StateRecordAuth {
    let seed = signing_seed();
    StateRecordAuth::Certificate(CertificateAuth {
        auth_url: format!("{base}/auth"),
        timeout: Duration::from_secs(2),
        public_key: public_key_hex(&seed).unwrap(),
        signing_key: seed,
    })
}

fn identity_service_config(base: &str, dob: DobComparison) -> VendorConfig {
    VendorConfig::IdentityService(IdentityServiceConfig {
        base_url: base.to_string(),
        account_id: ACCOUNT.into(),
        username: "svc-user".into(),
        password: Secret::new("svc-password"),
        workflow: WORKFLOW.into(),
        request_mode: RequestMode::Testing,
        timeout: Duration::from_secs(2),
        dob_comparison: dob,
    })
}

fn all_attributes_match() -> Value {
    json!({
        "transaction_id": "aamva-1",
        "verification_results": {
            "state_id_number": true,
            "dob": true,
            "last_name": true,
            "first_name": true,
            "address1": true
        }
    })
}

fn dob_full_failed() -> Value {
    json!({
        "Status": {"TransactionStatus": "failed", "ConversationId": "31000000000000"},
        "Products": [{
            "ProductType": "InstantVerify",
            "ProductStatus": "fail",
            "Items": [
                {"ItemName": "SSNVerified", "ItemStatus": "pass"},
                {"ItemName": "DOBYearVerified", "ItemStatus": "pass"},
                {"ItemName": "DOBFullVerified", "ItemStatus": "fail"}
            ]
        }]
    })
}

// ---------------------------------------------------------------------------
// State-record adapter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn certificate_mode_handshakes_then_presents_token() {
    let mock = Mock::new(StatusCode::OK, Some(all_attributes_match()));
    let base = spawn(mock.clone()).await;
    let config = state_record_config(&base, certificate(&base), Duration::from_secs(2));

    let outcome = StateRecordAdapter::new().verify(&applicant(), &config).await;

    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.transaction_id.as_deref(), Some("aamva-1"));
    assert_eq!(mock.auth_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        mock.authorization.lock().unwrap().as_deref(),
        Some("Bearer tok-1")
    );
}

#[tokio::test]
async fn unauthenticated_mode_skips_handshake() {
    let mock = Mock::new(StatusCode::OK, Some(all_attributes_match()));
    let base = spawn(mock.clone()).await;
    let config = state_record_config(&base, StateRecordAuth::Unauthenticated, Duration::from_secs(2));

    let outcome = StateRecordAdapter::new().verify(&applicant(), &config).await;

    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(mock.auth_calls.load(Ordering::SeqCst), 0);
    assert_eq!(mock.verify_calls.load(Ordering::SeqCst), 1);
    assert!(mock.authorization.lock().unwrap().is_none());

    let sent = mock.received.lock().unwrap().clone().unwrap();
    assert_eq!(sent["state_id_number"], "1111111111111");
    assert_eq!(sent["dob"], "1938-10-06");
}

#[tokio::test]
async fn mismatched_public_key_fails_before_any_request() {
    let mock = Mock::new(StatusCode::OK, Some(all_attributes_match()));
    let base = spawn(mock.clone()).await;
    let auth = StateRecordAuth::Certificate(CertificateAuth {
        auth_url: format!("{base}/auth"),
        timeout: Duration::from_secs(2),
        signing_key: signing_seed(),
        public_key: "00".repeat(32),
    });
    let config = state_record_config(&base, auth, Duration::from_secs(2));

    let outcome = StateRecordAdapter::new().verify(&applicant(), &config).await;

    assert_eq!(outcome.status, OutcomeStatus::Error);
    assert_eq!(outcome.reasons[0].code(), "handshake_failed");
    assert_eq!(mock.auth_calls.load(Ordering::SeqCst), 0);
    assert_eq!(mock.verify_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn required_attribute_mismatch_is_failure() {
    let body = json!({
        "transaction_id": "aamva-2",
        "verification_results": {
            "state_id_number": true, "dob": false, "last_name": true, "first_name": true
        }
    });
    let base = spawn(Mock::new(StatusCode::OK, Some(body))).await;
    let config = state_record_config(&base, StateRecordAuth::Unauthenticated, Duration::from_secs(2));

    let outcome = StateRecordAdapter::new().verify(&applicant(), &config).await;

    assert_eq!(outcome.status, OutcomeStatus::Failure);
    assert_eq!(outcome.reasons, vec![ReasonCode::new("mismatch:dob")]);
}

#[tokio::test]
async fn applicant_without_state_id_fails_without_calling_vendor() {
    let mock = Mock::new(StatusCode::OK, Some(all_attributes_match()));
    let base = spawn(mock.clone()).await;
    let config = state_record_config(&base, StateRecordAuth::Unauthenticated, Duration::from_secs(2));
    let mut identity = applicant();
    identity.state_id = None;

    let outcome = StateRecordAdapter::new().verify(&identity, &config).await;

    assert_eq!(outcome.status, OutcomeStatus::Failure);
    assert_eq!(outcome.reasons, vec![ReasonCode::new("state_id_missing")]);
    assert_eq!(mock.verify_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn server_error_maps_to_error_with_status() {
    let base = spawn(Mock::new(StatusCode::INTERNAL_SERVER_ERROR, Some(json!({})))).await;
    let config = state_record_config(&base, StateRecordAuth::Unauthenticated, Duration::from_secs(2));

    let outcome = StateRecordAdapter::new().verify(&applicant(), &config).await;

    assert_eq!(outcome.status, OutcomeStatus::Error);
    assert_eq!(outcome.reasons, vec![ReasonCode::new("http_status:500")]);
}

#[tokio::test]
async fn slow_vendor_times_out_within_bound() {
    let mock = Mock::new(StatusCode::OK, Some(all_attributes_match())).delayed(Duration::from_secs(5));
    let base = spawn(mock).await;
    let config =
        state_record_config(&base, StateRecordAuth::Unauthenticated, Duration::from_millis(300));

    let started = Instant::now();
    let outcome = StateRecordAdapter::new().verify(&applicant(), &config).await;

    assert_eq!(outcome.status, OutcomeStatus::Timeout);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn refused_connection_is_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let config = state_record_config(&base, StateRecordAuth::Unauthenticated, Duration::from_secs(2));

    let outcome = StateRecordAdapter::new().verify(&applicant(), &config).await;

    assert_eq!(outcome.status, OutcomeStatus::Error);
    assert_eq!(outcome.reasons.len(), 1);
    let reason = outcome.reasons[0].as_str();
    assert!(
        reason == "connection_failed:connection_refused" || reason == "connection_failed:connect",
        "unexpected reason {reason}"
    );
}

#[tokio::test]
async fn wrong_config_variant_is_error() {
    let config = identity_service_config("http://127.0.0.1:9", DobComparison::Full);
    let outcome = StateRecordAdapter::new().verify(&applicant(), &config).await;
    assert_eq!(outcome.status, OutcomeStatus::Error);
    assert_eq!(outcome.reasons[0].code(), "config_mismatch");
}

// ---------------------------------------------------------------------------
// Identity-service adapter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn year_only_mode_accepts_matching_birth_year() {
    let mock = Mock::new(StatusCode::OK, Some(dob_full_failed()));
    let base = spawn(mock.clone()).await;
    let config = identity_service_config(&base, DobComparison::YearOnly);

    let outcome = IdentityServiceAdapter::new().verify(&applicant(), &config).await;

    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.transaction_id.as_deref(), Some("31000000000000"));

    let authorization = mock.authorization.lock().unwrap().clone().unwrap();
    assert!(authorization.starts_with("Basic "));

    let sent = mock.received.lock().unwrap().clone().unwrap();
    assert_eq!(sent["Settings"]["Mode"], "testing");
    assert_eq!(sent["Person"]["SSN"], "900123456");
    assert_eq!(sent["Person"]["Addresses"][0]["Zip5"], "59010");
}

#[tokio::test]
async fn full_date_mode_reports_dob_mismatch() {
    let base = spawn(Mock::new(StatusCode::OK, Some(dob_full_failed()))).await;
    let config = identity_service_config(&base, DobComparison::Full);

    let outcome = IdentityServiceAdapter::new().verify(&applicant(), &config).await;

    assert_eq!(outcome.status, OutcomeStatus::Failure);
    assert_eq!(outcome.reasons, vec![ReasonCode::new("mismatch:DOBFullVerified")]);
}

#[tokio::test]
async fn malformed_body_is_error() {
    let base = spawn(Mock::new(StatusCode::OK, None)).await;
    let config = identity_service_config(&base, DobComparison::Full);

    let outcome = IdentityServiceAdapter::new().verify(&applicant(), &config).await;

    assert_eq!(outcome.status, OutcomeStatus::Error);
    // "<html>..." fails at the first byte.
    assert_eq!(outcome.reasons, vec![ReasonCode::new("malformed_response:syntax:1:1")]);
}
