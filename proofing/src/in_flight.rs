//! Registry of result handles with a run in progress.

use idproof_types::ResultHandle;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone, Debug, Default)]
pub struct InFlightRegistry {
    handles: Arc<Mutex<HashSet<ResultHandle>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `handle` for the caller. `None` if it is already claimed.
    /// The claim is released when the guard drops.
    pub fn try_acquire(&self, handle: &ResultHandle) -> Option<InFlightGuard> {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        if !handles.insert(handle.clone()) {
            return None;
        }
        Some(InFlightGuard {
            handles: self.handles.clone(),
            handle: handle.clone(),
        })
    }

    pub fn is_in_flight(&self, handle: &ResultHandle) -> bool {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(handle)
    }

    pub fn len(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct InFlightGuard {
    handles: Arc<Mutex<HashSet<ResultHandle>>>,
    handle: ResultHandle,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_fails_until_first_is_released() {
        let registry = InFlightRegistry::new();
        let handle = ResultHandle::new("h").unwrap();

        let guard = registry.try_acquire(&handle).unwrap();
        assert!(registry.try_acquire(&handle).is_none());
        assert!(registry.is_in_flight(&handle));

        drop(guard);
        assert!(registry.is_empty());
        assert!(registry.try_acquire(&handle).is_some());
    }

    #[test]
    fn handles_are_independent() {
        let registry = InFlightRegistry::new();
        let _a = registry.try_acquire(&ResultHandle::new("a").unwrap()).unwrap();
        let _b = registry.try_acquire(&ResultHandle::new("b").unwrap()).unwrap();
        assert_eq!(registry.len(), 2);
    }
}
