//! Proofing Orchestrator: drives one run from encrypted payload to
//! notified result.
//!
//! Vendor calls run as independent tasks in a [`JoinSet`], each under the
//! deadline of its own config. The set lives inside the run future, so
//! dropping the run (shutdown) aborts every vendor call still in flight and
//! nothing is written.

use std::collections::HashMap;
use std::sync::Arc;

use idproof_crypto::PayloadDecryptor;
use idproof_notify::{CallbackMessage, CallbackNotifier};
use idproof_store::{ResultStore, StoreError};
use idproof_types::{
    ApplicantIdentity, ExcludedVendor, ReasonCode, ResolutionResult, ResolutionStatus,
    RunParameters, Timestamp, VendorId, VendorOutcome,
};
use idproof_vendors::{IdentityServiceAdapter, StateRecordAdapter, VendorAdapter, VendorConfig};
use prometheus::IntGauge;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::Instrument;

use crate::state::RunTracker;
use crate::{
    aggregate, InFlightRegistry, ProofingError, ProofingJob, ProofingMetrics, RunState,
    VendorConfigResolver,
};

/// What happened to one run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// The result announced to the caller.
    pub result: ResolutionResult,
    pub final_state: RunState,
    /// The result was already stored; no vendor was consulted.
    pub replayed: bool,
    /// The result store holds `result`.
    pub stored: bool,
    pub notified: bool,
}

/// Inputs to the `Failed` path.
struct Failure {
    outcomes: Vec<VendorOutcome>,
    excluded: Vec<ExcludedVendor>,
    reason: ReasonCode,
}

pub struct ProofingOrchestrator {
    decryptor: PayloadDecryptor,
    resolver: VendorConfigResolver,
    adapters: HashMap<VendorId, Arc<dyn VendorAdapter>>,
    store: Arc<dyn ResultStore>,
    notifier: Arc<dyn CallbackNotifier>,
    in_flight: InFlightRegistry,
    metrics: Arc<ProofingMetrics>,
}

impl ProofingOrchestrator {
    /// An orchestrator with no vendor adapters registered.
    pub fn new(
        decryptor: PayloadDecryptor,
        resolver: VendorConfigResolver,
        store: Arc<dyn ResultStore>,
        notifier: Arc<dyn CallbackNotifier>,
        metrics: Arc<ProofingMetrics>,
    ) -> Self {
        Self {
            decryptor,
            resolver,
            adapters: HashMap::new(),
            store,
            notifier,
            in_flight: InFlightRegistry::new(),
            metrics,
        }
    }

    /// Register `adapter` for its vendor, replacing any previous one.
    pub fn with_adapter(mut self, adapter: Arc<dyn VendorAdapter>) -> Self {
        self.adapters.insert(adapter.vendor(), adapter);
        self
    }

    /// Register the HTTP adapters for every known vendor.
    pub fn with_default_adapters(self) -> Self {
        self.with_adapter(Arc::new(StateRecordAdapter::new()))
            .with_adapter(Arc::new(IdentityServiceAdapter::new()))
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    pub fn metrics(&self) -> &ProofingMetrics {
        &self.metrics
    }

    pub fn in_flight(&self) -> &InFlightRegistry {
        &self.in_flight
    }

    /// Execute one job.
    ///
    /// Returns `Err` only when the run could not start: another run for the
    /// same handle is in flight, or the store could not be read. Every run
    /// that starts ends with a terminal result, stored and announced.
    pub async fn run(&self, job: ProofingJob) -> Result<RunReport, ProofingError> {
        let params = job.parameters();
        let span = tracing::info_span!(
            "proofing_run",
            result_id = %params.handle,
            trace_id = %params.trace_id
        );

        async move {
            let Some(_claim) = self.in_flight.try_acquire(&params.handle) else {
                tracing::warn!("run already in flight for this result; rejecting duplicate");
                return Err(ProofingError::DuplicateInFlight(params.handle));
            };
            let _gauge = GaugeGuard::inc(&self.metrics.runs_in_flight);
            self.execute(&job.encrypted_arguments, params).await
        }
        .instrument(span)
        .await
    }

    /// Execute one job unless `shutdown` fires first. A cancelled run
    /// aborts its vendor calls and writes nothing.
    pub async fn run_until_cancelled(
        &self,
        job: ProofingJob,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<RunReport, ProofingError> {
        let handle = job.result_id.clone();
        tokio::select! {
            report = self.run(job) => report,
            _ = shutdown.recv() => {
                tracing::info!(result_id = %handle, "run cancelled by shutdown");
                Err(ProofingError::Cancelled)
            }
        }
    }

    async fn execute(
        &self,
        encrypted: &str,
        params: RunParameters,
    ) -> Result<RunReport, ProofingError> {
        let started = Instant::now();
        let mut tracker = RunTracker::new();

        if let Some(existing) = self.store.get(&params.handle)? {
            return Ok(self.replay(tracker, &params, existing).await);
        }

        let identity = match self.decryptor.decrypt(encrypted) {
            Ok(identity) => Arc::new(identity),
            Err(e) => {
                tracing::warn!(error = %e, "payload decryption failed");
                self.metrics.decryption_failures.inc();
                let failure = Failure {
                    outcomes: Vec::new(),
                    excluded: Vec::new(),
                    reason: ReasonCode::new(ReasonCode::DECRYPTION_FAILED),
                };
                return Ok(self.fail(tracker, &params, failure).await);
            }
        };
        tracker.advance(RunState::Decrypted);

        let plan = self.resolver.resolve(&params.flags);
        for excluded in &plan.excluded {
            tracing::debug!(vendor = %excluded.vendor, reason = %excluded.reason, "vendor planned out");
        }

        tracker.advance(RunState::VendorsDispatched);
        let (outcomes, fault) = self.dispatch(identity, plan.configs).await;
        if let Some(reason) = fault {
            let failure = Failure {
                outcomes,
                excluded: plan.excluded,
                reason,
            };
            return Ok(self.fail(tracker, &params, failure).await);
        }

        let verdict = match aggregate(&outcomes) {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(error = %e, "aggregation defect");
                let failure = Failure {
                    outcomes,
                    excluded: plan.excluded,
                    reason: ReasonCode::new(ReasonCode::AGGREGATION_AMBIGUITY),
                };
                return Ok(self.fail(tracker, &params, failure).await);
            }
        };
        tracker.advance(RunState::Aggregated);

        let result = ResolutionResult {
            handle: params.handle.clone(),
            trace_id: params.trace_id.clone(),
            status: verdict.status,
            outcomes,
            excluded: plan.excluded,
            reasons: verdict.reasons,
            policy: params.flags,
            completed_at: Timestamp::now(),
        };

        match self.store.put(&params.handle, &result) {
            Ok(()) => tracker.advance(RunState::Stored),
            Err(StoreError::Conflict(_)) => {
                tracing::error!("a different result is already stored; keeping the first write");
                tracker.advance(RunState::Failed);
                let stored = self.store.get(&params.handle).ok().flatten();
                let announced = stored.clone().unwrap_or(result);
                let notified = self.notify(&params, &announced).await;
                return Ok(RunReport {
                    result: announced,
                    final_state: tracker.state(),
                    replayed: false,
                    stored: stored.is_some(),
                    notified,
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "result write failed");
                let failure = Failure {
                    outcomes: result.outcomes,
                    excluded: result.excluded,
                    reason: ReasonCode::new(ReasonCode::STORE_FAILED),
                };
                return Ok(self.fail(tracker, &params, failure).await);
            }
        }

        let notified = self.notify(&params, &result).await;
        tracker.advance(RunState::Notified);
        tracker.advance(RunState::Done);

        self.metrics.record_run(result.status);
        tracing::info!(
            status = %result.status,
            vendors = result.outcomes.len(),
            elapsed_ms = elapsed_ms(started),
            "run complete"
        );
        Ok(RunReport {
            result,
            final_state: tracker.state(),
            replayed: false,
            stored: true,
            notified,
        })
    }

    /// Call every planned vendor concurrently and wait for all of them.
    ///
    /// Returns the outcomes, sorted by vendor, and a reason if a vendor
    /// task died without producing one.
    async fn dispatch(
        &self,
        identity: Arc<ApplicantIdentity>,
        configs: Vec<VendorConfig>,
    ) -> (Vec<VendorOutcome>, Option<ReasonCode>) {
        let mut tasks = JoinSet::new();
        let mut outcomes = Vec::with_capacity(configs.len());

        for config in configs {
            let vendor = config.vendor();
            let Some(adapter) = self.adapters.get(&vendor).cloned() else {
                tracing::error!(vendor = %vendor, "no adapter registered");
                outcomes.push(VendorOutcome::error(
                    vendor,
                    ReasonCode::with_detail(ReasonCode::DISPATCH_FAILED, "no_adapter"),
                ));
                continue;
            };
            tasks.spawn(call_vendor(adapter, identity.clone(), config).in_current_span());
        }
        drop(identity);

        let mut fault = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    tracing::info!(
                        vendor = %outcome.vendor,
                        status = %outcome.status,
                        elapsed_ms = outcome.elapsed_ms,
                        "vendor outcome"
                    );
                    self.metrics.record_outcome(&outcome);
                    outcomes.push(outcome);
                }
                Err(e) => {
                    tracing::error!(error = %e, "vendor task died");
                    let detail = if e.is_panic() { "panic" } else { "cancelled" };
                    fault = Some(ReasonCode::with_detail(ReasonCode::DISPATCH_FAILED, detail));
                }
            }
        }

        outcomes.sort_by_key(|o| o.vendor);
        (outcomes, fault)
    }

    /// The stored result answers the job; announce it again.
    async fn replay(
        &self,
        mut tracker: RunTracker,
        params: &RunParameters,
        existing: ResolutionResult,
    ) -> RunReport {
        tracing::info!(status = %existing.status, "result already stored; replaying notification");
        self.metrics.replays.inc();
        tracker.advance(RunState::Stored);
        let notified = self.notify(params, &existing).await;
        tracker.advance(RunState::Notified);
        tracker.advance(RunState::Done);
        RunReport {
            result: existing,
            final_state: tracker.state(),
            replayed: true,
            stored: true,
            notified,
        }
    }

    /// Terminal `Failed`: best-effort `Error` write, then notify anyway.
    async fn fail(
        &self,
        mut tracker: RunTracker,
        params: &RunParameters,
        failure: Failure,
    ) -> RunReport {
        tracker.advance(RunState::Failed);

        let mut result = ResolutionResult::error(
            params.handle.clone(),
            params.trace_id.clone(),
            params.flags,
            failure.reason,
        );
        result.outcomes = failure.outcomes;
        result.excluded = failure.excluded;

        let stored = match self.store.put(&params.handle, &result) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "could not store error result");
                false
            }
        };
        let notified = self.notify(params, &result).await;

        self.metrics.record_run(ResolutionStatus::Error);
        tracing::warn!(reasons = ?result.reasons, "run failed");
        RunReport {
            result,
            final_state: tracker.state(),
            replayed: false,
            stored,
            notified,
        }
    }

    /// Deliver the terminal notification. Failure is logged and counted;
    /// the stored result stays retrievable by handle.
    async fn notify(&self, params: &RunParameters, result: &ResolutionResult) -> bool {
        let message = CallbackMessage::from(result);
        match self.notifier.notify(&params.callback, &message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "callback delivery failed; result remains retrievable");
                self.metrics.notification_failures.inc();
                false
            }
        }
    }
}

/// One vendor call, bounded by the config's deadline.
async fn call_vendor(
    adapter: Arc<dyn VendorAdapter>,
    identity: Arc<ApplicantIdentity>,
    config: VendorConfig,
) -> VendorOutcome {
    let vendor = config.vendor();
    let started = Instant::now();
    let outcome = match tokio::time::timeout(config.deadline(), adapter.verify(&identity, &config))
        .await
    {
        Ok(outcome) => outcome,
        Err(_) => VendorOutcome::timeout(vendor, ReasonCode::new(ReasonCode::DEADLINE_EXCEEDED)),
    };
    outcome.with_elapsed_ms(elapsed_ms(started))
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Keeps the in-flight gauge balanced even when the run is dropped.
struct GaugeGuard(IntGauge);

impl GaugeGuard {
    fn inc(gauge: &IntGauge) -> Self {
        gauge.inc();
        Self(gauge.clone())
    }
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.0.dec();
    }
}
