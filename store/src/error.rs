use idproof_types::ResultHandle;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A different result is already stored under this handle.
    #[error("conflicting result already stored for handle {0}")]
    Conflict(ResultHandle),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),
}
