//! Nullable vendor: scripted outcomes without any network.

use async_trait::async_trait;
use idproof_types::{ApplicantIdentity, VendorId, VendorOutcome};
use idproof_vendors::{VendorAdapter, VendorConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a [`ScriptedVendor`] does when called.
#[derive(Clone, Debug)]
pub enum Script {
    /// Return the outcome immediately.
    Respond(VendorOutcome),
    /// Return the outcome after a delay.
    Delay(Duration, VendorOutcome),
    /// Never return.
    Hang,
    /// Panic inside the call.
    Panic,
}

/// A vendor adapter driven by a [`Script`].
///
/// Counts calls, completions and calls dropped before completing (i.e.
/// aborted), and records every config it was handed.
pub struct ScriptedVendor {
    vendor: VendorId,
    script: Script,
    calls: AtomicUsize,
    completed: AtomicUsize,
    aborted: Arc<AtomicUsize>,
    configs: Mutex<Vec<VendorConfig>>,
}

impl ScriptedVendor {
    pub fn new(vendor: VendorId, script: Script) -> Self {
        Self {
            vendor,
            script,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            aborted: Arc::new(AtomicUsize::new(0)),
            configs: Mutex::new(Vec::new()),
        }
    }

    pub fn responding(outcome: VendorOutcome) -> Self {
        Self::new(outcome.vendor, Script::Respond(outcome))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Calls whose future was dropped before returning.
    pub fn aborted(&self) -> usize {
        self.aborted.load(Ordering::SeqCst)
    }

    pub fn configs(&self) -> Vec<VendorConfig> {
        self.configs.lock().unwrap().clone()
    }
}

/// Counts itself as aborted unless disarmed before drop.
struct AbortProbe {
    aborted: Arc<AtomicUsize>,
    armed: bool,
}

impl Drop for AbortProbe {
    fn drop(&mut self) {
        if self.armed {
            self.aborted.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl VendorAdapter for ScriptedVendor {
    fn vendor(&self) -> VendorId {
        self.vendor
    }

    async fn verify(&self, _identity: &ApplicantIdentity, config: &VendorConfig) -> VendorOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.configs.lock().unwrap().push(config.clone());
        let mut probe = AbortProbe {
            aborted: self.aborted.clone(),
            armed: true,
        };

        let outcome = match &self.script {
            Script::Respond(outcome) => outcome.clone(),
            Script::Delay(delay, outcome) => {
                tokio::time::sleep(*delay).await;
                outcome.clone()
            }
            Script::Hang => std::future::pending().await,
            Script::Panic => {
                probe.armed = false;
                panic!("scripted vendor panic");
            }
        };

        probe.armed = false;
        self.completed.fetch_add(1, Ordering::SeqCst);
        outcome
    }
}
