//! Intake routes and the queue-to-worker path, against nullable
//! collaborators.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use idproof_crypto::{Keyring, PayloadDecryptor, PayloadKey};
use idproof_nullables::{NullNotifier, NullResultStore, ScriptedVendor};
use idproof_proofing::{
    IdentityServiceSettings, ProofingMetrics, ProofingOrchestrator, ProofingSettings,
    StateRecordSettings, VendorConfigResolver,
};
use idproof_store::ResultStore;
use idproof_types::{
    Address, ApplicantIdentity, CallbackTarget, ResolutionResult, ResolutionStatus, ResultHandle,
    Secret, TraceId, VendorId, VendorOutcome,
};
use idproof_worker::{
    router, serve_until, spawn_workers, AppState, JobQueue, ShutdownController,
};
use serde_json::Value;
use tower::ServiceExt;

fn settings() -> ProofingSettings {
    ProofingSettings {
        state_record: StateRecordSettings {
            verification_url: "https://records.example/verify".into(),
            ..StateRecordSettings::default()
        },
        identity_service: IdentityServiceSettings {
            base_url: "https://identity.example".into(),
            account_id: "12345".into(),
            username: "svc".into(),
            password: Secret::new("pw"),
            instant_verify_workflow: "customers.instant.verify".into(),
            ..IdentityServiceSettings::default()
        },
    }
}

fn decryptor() -> PayloadDecryptor {
    PayloadDecryptor::new(
        Keyring::new()
            .with_key(PayloadKey::new("session-1", [7u8; 32], None).unwrap())
            .unwrap(),
    )
}

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
            zipcode: "59010".into(),
        },
        state_id: None,
    }
}

struct Fixture {
    state: AppState,
    receiver: idproof_worker::queue::JobReceiver,
    store: Arc<NullResultStore>,
    notifier: Arc<NullNotifier>,
}

fn fixture(capacity: usize) -> Fixture {
    let store = Arc::new(NullResultStore::new());
    let notifier = Arc::new(NullNotifier::new());
    let orchestrator = ProofingOrchestrator::new(
        decryptor(),
        VendorConfigResolver::new(settings()).unwrap(),
        store.clone(),
        notifier.clone(),
        Arc::new(ProofingMetrics::new().unwrap()),
    )
    .with_adapter(Arc::new(ScriptedVendor::responding(VendorOutcome::success(
        VendorId::IdentityService,
    ))));
    let (queue, receiver) = JobQueue::bounded(capacity);
    Fixture {
        state: AppState {
            queue,
            orchestrator: Arc::new(orchestrator),
        },
        receiver,
        store,
        notifier,
    }
}

fn job_json(result_id: &str) -> String {
    serde_json::json!({
        "result_id": result_id,
        "encrypted_arguments": decryptor().encrypt(&applicant()).unwrap(),
        "callback_url": "https://caller.example/done",
        "trace_id": "trace-1",
    })
    .to_string()
}

async fn post_job(state: AppState, body: String) -> (StatusCode, Value) {
    let response = router(state)
        .oneshot(
            Request::post("/jobs")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .expect("router response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(state: AppState, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router(state)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .expect("router response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn valid_job_is_accepted_and_queued() {
    let fx = fixture(4);
    let (status, body) = post_job(fx.state.clone(), job_json("r-1")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["result_id"], "r-1");
    assert_eq!(body["status"], "queued");
    assert_eq!(fx.state.queue.depth(), 1);
}

#[tokio::test]
async fn malformed_job_is_rejected_without_echoing_input() {
    let fx = fixture(4);
    let body = r#"{"result_id": "r-1", "encrypted_arguments": "SECRETCIPHER", "callback_url": "ftp://nope", "trace_id": "t"}"#;
    let (status, json) = post_job(fx.state.clone(), body.to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_job");
    assert_eq!(json["category"], "data");
    assert!(!json.to_string().contains("SECRETCIPHER"));
    assert_eq!(fx.state.queue.depth(), 0);
}

#[tokio::test]
async fn full_queue_answers_service_unavailable() {
    let fx = fixture(1);
    let (first, _) = post_job(fx.state.clone(), job_json("r-1")).await;
    assert_eq!(first, StatusCode::ACCEPTED);
    let (second, json) = post_job(fx.state.clone(), job_json("r-2")).await;
    assert_eq!(second, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], "queue_full");
}

#[tokio::test]
async fn result_route_reads_the_store() {
    let fx = fixture(4);
    let (missing, _) = get(fx.state.clone(), "/results/r-404").await;
    assert_eq!(missing, StatusCode::NOT_FOUND);

    fx.store.insert(ResolutionResult::error(
        ResultHandle::new("r-9").unwrap(),
        TraceId::new("t-9"),
        Default::default(),
        idproof_types::ReasonCode::new(idproof_types::ReasonCode::DECRYPTION_FAILED),
    ));
    let (found, bytes) = get(fx.state.clone(), "/results/r-9").await;
    assert_eq!(found, StatusCode::OK);
    let result: ResolutionResult = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(result.status, ResolutionStatus::Error);
    assert_eq!(result.trace_id, TraceId::new("t-9"));
}

#[tokio::test]
async fn result_route_reports_runs_in_progress() {
    let fx = fixture(4);
    let handle = ResultHandle::new("r-busy").unwrap();
    let _claim = fx.state.orchestrator.in_flight().try_acquire(&handle).unwrap();
    let (status, bytes) = get(fx.state.clone(), "/results/r-busy").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "in_progress");
}

#[tokio::test]
async fn metrics_and_health_respond() {
    let fx = fixture(4);
    let (status, bytes) = get(fx.state.clone(), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(bytes).unwrap().contains("idproof_replays_total"));

    let (status, bytes) = get(fx.state.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["queue_capacity"], 4);
}

#[tokio::test]
async fn queued_job_is_proofed_stored_and_notified() {
    let fx = fixture(4);
    let shutdown = ShutdownController::new();
    let mut workers = spawn_workers(
        2,
        fx.state.orchestrator.clone(),
        fx.state.queue.clone(),
        fx.receiver.clone(),
        &shutdown,
    );

    let (status, _) = post_job(fx.state.clone(), job_json("r-e2e")).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    tokio::time::timeout(Duration::from_secs(5), async {
        while fx.notifier.calls() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("job should be notified");

    let handle = ResultHandle::new("r-e2e").unwrap();
    let stored = fx.store.get(&handle).unwrap().expect("result stored");
    assert_eq!(stored.status, ResolutionStatus::Verified);
    let (target, message) = &fx.notifier.sent()[0];
    assert_eq!(target, &CallbackTarget::new("https://caller.example/done").unwrap());
    assert_eq!(message.result_id, handle);

    shutdown.shutdown();
    tokio::time::timeout(Duration::from_secs(5), async {
        while workers.join_next().await.is_some() {}
    })
    .await
    .expect("workers stop on shutdown");
}

#[tokio::test]
async fn failed_bind_ends_serving_and_shuts_workers_down() {
    let fx = fixture(4);
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap();

    let shutdown = ShutdownController::new();
    let mut workers = spawn_workers(
        1,
        fx.state.orchestrator.clone(),
        fx.state.queue.clone(),
        fx.receiver.clone(),
        &shutdown,
    );

    let served = tokio::time::timeout(
        Duration::from_secs(5),
        serve_until(addr, fx.state.clone(), &shutdown, std::future::pending()),
    )
    .await
    .expect("a failed bind must not wait for a signal");
    assert!(served.is_err());

    tokio::time::timeout(Duration::from_secs(5), async {
        while workers.join_next().await.is_some() {}
    })
    .await
    .expect("workers stop when the endpoint fails");
    drop(taken);
}

#[tokio::test]
async fn stop_signal_ends_serving_cleanly() {
    let fx = fixture(4);
    let shutdown = ShutdownController::new();
    let mut observer = shutdown.subscribe();
    let addr = "127.0.0.1:0".parse().unwrap();

    let served = tokio::time::timeout(
        Duration::from_secs(5),
        serve_until(addr, fx.state.clone(), &shutdown, async {}),
    )
    .await
    .expect("serving ends once stop resolves");
    assert!(served.is_ok());
    assert!(observer.try_recv().is_ok());
}
