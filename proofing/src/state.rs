//! Run state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a run is. `Done` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Start,
    Decrypted,
    VendorsDispatched,
    Aggregated,
    Stored,
    Notified,
    Done,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Decrypted => "decrypted",
            Self::VendorsDispatched => "vendors_dispatched",
            Self::Aggregated => "aggregated",
            Self::Stored => "stored",
            Self::Notified => "notified",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Legal transitions. `Start → Stored` is the replay of an existing
    /// result; `Failed` is reachable from every non-terminal state.
    pub fn can_advance_to(&self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Start, Decrypted)
            | (Start, Stored)
            | (Decrypted, VendorsDispatched)
            | (VendorsDispatched, Aggregated)
            | (Aggregated, Stored)
            | (Stored, Notified)
            | (Notified, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks a single run's state and logs every transition.
#[derive(Debug)]
pub(crate) struct RunTracker {
    state: RunState,
}

impl RunTracker {
    pub(crate) fn new() -> Self {
        Self {
            state: RunState::Start,
        }
    }

    pub(crate) fn state(&self) -> RunState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal run transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "run state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_linear() {
        use RunState::*;
        let path = [Start, Decrypted, VendorsDispatched, Aggregated, Stored, Notified, Done];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(!Start.can_advance_to(VendorsDispatched));
        assert!(!Stored.can_advance_to(Aggregated));
    }

    #[test]
    fn failed_reachable_only_from_non_terminal_states() {
        use RunState::*;
        for s in [Start, Decrypted, VendorsDispatched, Aggregated, Stored, Notified] {
            assert!(s.can_advance_to(Failed));
        }
        assert!(!Done.can_advance_to(Failed));
        assert!(!Failed.can_advance_to(Failed));
    }
}
