//! Abstract storage traits for idproof.
//!
//! Every result-store backend (LMDB, in-memory for testing) implements
//! [`ResultStore`]. The orchestrator depends only on the trait.

pub mod error;

pub use error::StoreError;

use idproof_types::{ResolutionResult, ResultHandle};

/// Write-once-read-many storage of resolution results, keyed by handle.
///
/// # Contract
///
/// - `put` followed by `get` on the same handle returns an equal result.
/// - `put` with a result equal to the stored one is a no-op.
/// - `put` with a result that differs from the stored one fails with
///   [`StoreError::Conflict`] and leaves the stored result untouched.
/// - Handles are independent; no cross-handle locking is implied.
pub trait ResultStore: Send + Sync {
    fn put(&self, handle: &ResultHandle, result: &ResolutionResult) -> Result<(), StoreError>;

    fn get(&self, handle: &ResultHandle) -> Result<Option<ResolutionResult>, StoreError>;

    fn contains(&self, handle: &ResultHandle) -> Result<bool, StoreError> {
        Ok(self.get(handle)?.is_some())
    }
}

/// What a backend should do with a `put`, given what it already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutDecision {
    Insert,
    Unchanged,
}

/// Apply the write-once rule shared by all backends.
pub fn decide_put(
    handle: &ResultHandle,
    existing: Option<&ResolutionResult>,
    incoming: &ResolutionResult,
) -> Result<PutDecision, StoreError> {
    match existing {
        None => Ok(PutDecision::Insert),
        Some(stored) if stored == incoming => Ok(PutDecision::Unchanged),
        Some(_) => Err(StoreError::Conflict(handle.clone())),
    }
}
