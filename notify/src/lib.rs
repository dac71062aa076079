//! Callback Notifier: tells the enqueuing caller that a result is ready.
//!
//! Delivery is best effort. The result is already durable in the result
//! store before a notifier is invoked, so a failed delivery leaves the
//! caller able to poll by handle.

pub mod error;
pub mod http;
pub mod message;

pub use error::NotificationError;
pub use http::HttpCallbackNotifier;
pub use message::CallbackMessage;

use async_trait::async_trait;
use idproof_types::CallbackTarget;

/// Delivers a [`CallbackMessage`] to a caller-supplied target.
#[async_trait]
pub trait CallbackNotifier: Send + Sync {
    async fn notify(
        &self,
        target: &CallbackTarget,
        message: &CallbackMessage,
    ) -> Result<(), NotificationError>;
}
