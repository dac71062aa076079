//! HTTP POST delivery of callback messages.

use async_trait::async_trait;
use idproof_types::CallbackTarget;
use std::time::Duration;

use crate::{CallbackMessage, CallbackNotifier, NotificationError};

/// Default timeout for a single callback delivery.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Posts `CallbackMessage` as JSON to the target URL.
///
/// Any 2xx response counts as delivered.
#[derive(Clone)]
pub struct HttpCallbackNotifier {
    http_client: reqwest::Client,
}

impl HttpCallbackNotifier {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()
            .unwrap_or_default();
        Self { http_client }
    }
}

impl Default for HttpCallbackNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CallbackNotifier for HttpCallbackNotifier {
    async fn notify(
        &self,
        target: &CallbackTarget,
        message: &CallbackMessage,
    ) -> Result<(), NotificationError> {
        let response = self
            .http_client
            .post(target.as_str())
            .json(message)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotificationError::Timeout
                } else if e.is_connect() {
                    NotificationError::Unreachable(format!("connection failed: {e}"))
                } else {
                    NotificationError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::Rejected(status.as_u16()));
        }

        tracing::debug!(
            result_id = %message.result_id,
            status = %message.status,
            "callback delivered"
        );
        Ok(())
    }
}
