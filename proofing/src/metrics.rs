//! Prometheus metrics for proofing runs.
//!
//! [`ProofingMetrics`] owns a dedicated [`Registry`] that the worker's
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, HistogramOpts,
    HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use idproof_types::{ResolutionStatus, VendorOutcome};

pub struct ProofingMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Completed runs by terminal resolution status.
    pub runs: IntCounterVec,
    /// Runs answered from an already-stored result.
    pub replays: IntCounter,
    /// Payloads that could not be decrypted.
    pub decryption_failures: IntCounter,
    /// Vendor outcomes by vendor and outcome status.
    pub vendor_outcomes: IntCounterVec,
    /// Callback deliveries that failed.
    pub notification_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Runs currently executing.
    pub runs_in_flight: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Vendor call latency in milliseconds, by vendor.
    pub vendor_latency_ms: HistogramVec,
}

impl ProofingMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let runs = register_int_counter_vec_with_registry!(
            Opts::new("idproof_runs_total", "Proofing runs by resolution status"),
            &["status"],
            registry
        )?;

        let replays = register_int_counter_with_registry!(
            Opts::new(
                "idproof_replays_total",
                "Runs answered from an existing stored result"
            ),
            registry
        )?;

        let decryption_failures = register_int_counter_with_registry!(
            Opts::new(
                "idproof_decryption_failures_total",
                "Applicant payloads that failed to decrypt"
            ),
            registry
        )?;

        let vendor_outcomes = register_int_counter_vec_with_registry!(
            Opts::new(
                "idproof_vendor_outcomes_total",
                "Vendor outcomes by vendor and status"
            ),
            &["vendor", "status"],
            registry
        )?;

        let notification_failures = register_int_counter_with_registry!(
            Opts::new(
                "idproof_notification_failures_total",
                "Callback deliveries that failed"
            ),
            registry
        )?;

        let runs_in_flight = register_int_gauge_with_registry!(
            Opts::new("idproof_runs_in_flight", "Proofing runs currently executing"),
            registry
        )?;

        // 5 ms → ~40 s
        let vendor_latency_ms = register_histogram_vec_with_registry!(
            HistogramOpts::new(
                "idproof_vendor_latency_ms",
                "Vendor call latency in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(5.0, 2.0, 14)?),
            &["vendor"],
            registry
        )?;

        Ok(Self {
            registry,
            runs,
            replays,
            decryption_failures,
            vendor_outcomes,
            notification_failures,
            runs_in_flight,
            vendor_latency_ms,
        })
    }

    pub fn record_outcome(&self, outcome: &VendorOutcome) {
        self.vendor_outcomes
            .with_label_values(&[outcome.vendor.as_str(), outcome.status.as_str()])
            .inc();
        self.vendor_latency_ms
            .with_label_values(&[outcome.vendor.as_str()])
            .observe(outcome.elapsed_ms as f64);
    }

    pub fn record_run(&self, status: ResolutionStatus) {
        self.runs.with_label_values(&[status.as_str()]).inc();
    }

    /// Text exposition of every registered series.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
