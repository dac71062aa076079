//! HTTP intake and read endpoint.
//!
//! - `POST /jobs` accepts a [`ProofingJob`] and queues it (202).
//! - `GET /results/:result_id` reads a stored result.
//! - `GET /metrics` exposes the proofing metrics in Prometheus text format.
//! - `GET /health` reports queue depth and runs in flight.
//!
//! Request bodies are never echoed back or logged; they carry ciphertext
//! and callers' identifiers only, but the same rule holds for both.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use idproof_proofing::{ProofingJob, ProofingOrchestrator};
use idproof_store::ResultStore;
use idproof_types::ResultHandle;
use serde_json::json;
use tokio::sync::broadcast;

use crate::queue::{EnqueueError, JobQueue};
use crate::ShutdownController;

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub queue: JobQueue,
    pub orchestrator: Arc<ProofingOrchestrator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/jobs", post(submit_handler))
        .route("/results/:result_id", get(result_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` fires.
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "intake endpoint listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}

/// Serve until `stop` resolves or the server ends on its own (e.g. the
/// address is taken). Either way `shutdown` is triggered before returning,
/// and the server's own error is returned.
pub async fn serve_until<F>(
    addr: SocketAddr,
    state: AppState,
    shutdown: &ShutdownController,
    stop: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    let server = serve(addr, state, shutdown.subscribe());
    tokio::pin!(server);

    let result = tokio::select! {
        result = &mut server => {
            if let Err(e) = &result {
                tracing::error!(error = %e, "intake endpoint stopped; shutting down");
            }
            result
        }
        _ = stop => {
            shutdown.shutdown();
            server.await
        }
    };
    shutdown.shutdown();
    result
}

fn json_category(e: &serde_json::Error) -> &'static str {
    match e.classify() {
        serde_json::error::Category::Io => "io",
        serde_json::error::Category::Syntax => "syntax",
        serde_json::error::Category::Data => "data",
        serde_json::error::Category::Eof => "eof",
    }
}

async fn submit_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let job: ProofingJob = match serde_json::from_slice(&body) {
        Ok(job) => job,
        Err(e) => {
            tracing::debug!(category = json_category(&e), "rejected malformed job");
            let payload = json!({
                "error": "invalid_job",
                "category": json_category(&e),
                "line": e.line(),
                "column": e.column(),
            });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let result_id = job.result_id.to_string();
    match state.queue.try_enqueue(job) {
        Ok(()) => {
            tracing::debug!(result_id = %result_id, "job queued");
            let payload = json!({
                "result_id": result_id,
                "status": "queued",
            });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Err(EnqueueError::Full) => {
            tracing::warn!(result_id = %result_id, "job queue full; rejecting");
            let payload = json!({ "error": "queue_full" });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
        Err(EnqueueError::Closed) => {
            let payload = json!({ "error": "shutting_down" });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
    }
}

async fn result_handler(
    State(state): State<AppState>,
    Path(result_id): Path<String>,
) -> Response {
    let Ok(handle) = ResultHandle::new(result_id) else {
        let payload = json!({ "error": "invalid_result_id" });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    match state.orchestrator.store().get(&handle) {
        Ok(Some(result)) => (StatusCode::OK, axum::Json(result)).into_response(),
        Ok(None) if state.orchestrator.in_flight().is_in_flight(&handle) => {
            let payload = json!({
                "result_id": handle.as_str(),
                "status": "in_progress",
            });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Ok(None) => {
            let payload = json!({
                "result_id": handle.as_str(),
                "error": "not_found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(e) => {
            tracing::error!(result_id = %handle, error = %e, "result read failed");
            let payload = json!({ "error": "store_unavailable" });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.orchestrator.metrics().encode() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "metrics encoding failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> Response {
    let payload = json!({
        "status": "ok",
        "queue_depth": state.queue.depth(),
        "queue_capacity": state.queue.capacity(),
        "runs_in_flight": state.orchestrator.in_flight().len(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}
