//! Job input as enqueued by the caller.

use idproof_types::{CallbackTarget, ProofingFlags, ResultHandle, RunParameters, TraceId};
use serde::{Deserialize, Serialize};

/// One proofing request. The applicant payload stays encrypted until the
/// orchestrator opens it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofingJob {
    pub result_id: ResultHandle,
    pub encrypted_arguments: String,
    pub callback_url: CallbackTarget,
    pub trace_id: TraceId,
    #[serde(default)]
    pub should_proof_state_id: bool,
    #[serde(default)]
    pub dob_year_only: bool,
}

impl ProofingJob {
    pub fn flags(&self) -> ProofingFlags {
        ProofingFlags {
            should_proof_state_id: self.should_proof_state_id,
            dob_year_only: self.dob_year_only,
        }
    }

    pub fn parameters(&self) -> RunParameters {
        RunParameters {
            handle: self.result_id.clone(),
            trace_id: self.trace_id.clone(),
            flags: self.flags(),
            callback: self.callback_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_queue_json() {
        let job: ProofingJob = serde_json::from_str(
            r#"{"result_id": "r-1", "encrypted_arguments": "01ab",
                "callback_url": "https://caller.example/done", "trace_id": "t-1",
                "should_proof_state_id": true, "dob_year_only": false}"#,
        )
        .unwrap();
        let params = job.parameters();
        assert_eq!(params.handle.as_str(), "r-1");
        assert!(params.flags.should_proof_state_id);
        assert!(!params.flags.dob_year_only);
    }

    #[test]
    fn rejects_bad_callback_and_empty_handle() {
        assert!(serde_json::from_str::<ProofingJob>(
            r#"{"result_id": "r-1", "encrypted_arguments": "", "callback_url": "ftp://x", "trace_id": "t"}"#
        )
        .is_err());
        assert!(serde_json::from_str::<ProofingJob>(
            r#"{"result_id": "", "encrypted_arguments": "", "callback_url": "https://x", "trace_id": "t"}"#
        )
        .is_err());
    }
}
