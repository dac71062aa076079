use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("callback target unreachable: {0}")]
    Unreachable(String),

    #[error("callback timed out")]
    Timeout,

    #[error("callback rejected with HTTP status {0}")]
    Rejected(u16),

    #[error("callback request failed: {0}")]
    RequestFailed(String),
}
