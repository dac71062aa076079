//! Nullable result store: thread-safe in-memory storage for testing.

use idproof_store::{decide_put, PutDecision, ResultStore, StoreError};
use idproof_types::{ResolutionResult, ResultHandle};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// An in-memory result store applying the same write-once rule as the
/// durable backend. Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullResultStore {
    results: Mutex<HashMap<ResultHandle, ResolutionResult>>,
    put_calls: AtomicUsize,
    fail_puts: AtomicBool,
}

impl NullResultStore {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(HashMap::new()),
            put_calls: AtomicUsize::new(0),
            fail_puts: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `put` fail with a backend error.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Number of `put` calls, successful or not.
    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        self.results.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seed a result directly, bypassing the call counter.
    pub fn insert(&self, result: ResolutionResult) {
        self.results
            .lock()
            .unwrap()
            .insert(result.handle.clone(), result);
    }
}

impl Default for NullResultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStore for NullResultStore {
    fn put(&self, handle: &ResultHandle, result: &ResolutionResult) -> Result<(), StoreError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("null store configured to fail".into()));
        }
        let mut results = self.results.lock().unwrap();
        match decide_put(handle, results.get(handle), result)? {
            PutDecision::Insert => {
                results.insert(handle.clone(), result.clone());
            }
            PutDecision::Unchanged => {}
        }
        Ok(())
    }

    fn get(&self, handle: &ResultHandle) -> Result<Option<ResolutionResult>, StoreError> {
        Ok(self.results.lock().unwrap().get(handle).cloned())
    }
}
