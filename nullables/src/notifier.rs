//! Nullable notifier: record callbacks without delivering them.

use async_trait::async_trait;
use idproof_notify::{CallbackMessage, CallbackNotifier, NotificationError};
use idproof_types::CallbackTarget;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A notifier that records every call. Can be told to fail delivery.
pub struct NullNotifier {
    sent: Mutex<Vec<(CallbackTarget, CallbackMessage)>>,
    fail: AtomicBool,
}

impl NullNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// A notifier whose every delivery is rejected.
    pub fn failing() -> Self {
        let notifier = Self::new();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    /// Every notification attempted, including failed ones.
    pub fn sent(&self) -> Vec<(CallbackTarget, CallbackMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Default for NullNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CallbackNotifier for NullNotifier {
    async fn notify(
        &self,
        target: &CallbackTarget,
        message: &CallbackMessage,
    ) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .unwrap()
            .push((target.clone(), message.clone()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError::Rejected(503));
        }
        Ok(())
    }
}
