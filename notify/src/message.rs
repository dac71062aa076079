use idproof_types::{ResolutionResult, ResolutionStatus, ResultHandle, TraceId};
use serde::{Deserialize, Serialize};

/// Body of the terminal notification. Enough for the caller to fetch the
/// full result by handle, nothing more.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackMessage {
    pub result_id: ResultHandle,
    pub status: ResolutionStatus,
    pub trace_id: TraceId,
}

impl From<&ResolutionResult> for CallbackMessage {
    fn from(result: &ResolutionResult) -> Self {
        Self {
            result_id: result.handle.clone(),
            status: result.status,
            trace_id: result.trace_id.clone(),
        }
    }
}
