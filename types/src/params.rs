//! Run parameters supplied by the enqueuing caller.

use crate::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier addressing one verification attempt's result.
///
/// Carries no sensitive data, so it is safe to log.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResultHandle(String);

impl ResultHandle {
    pub const MAX_LEN: usize = 128;

    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        if value.trim().is_empty() || value.len() > Self::MAX_LEN {
            return Err(TypeError::InvalidHandle { max: Self::MAX_LEN });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl TryFrom<String> for ResultHandle {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResultHandle> for String {
    fn from(handle: ResultHandle) -> Self {
        handle.0
    }
}

impl fmt::Display for ResultHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cross-system correlation identifier. Not secret.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the terminal notification is delivered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CallbackTarget(String);

impl CallbackTarget {
    pub fn new(url: impl Into<String>) -> Result<Self, TypeError> {
        let url = url.into();
        let lower = url.to_ascii_lowercase();
        let rest = lower
            .strip_prefix("https://")
            .or_else(|| lower.strip_prefix("http://"));
        match rest {
            Some(host) if !host.is_empty() => Ok(Self(url)),
            _ => Err(TypeError::InvalidCallbackTarget),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CallbackTarget {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CallbackTarget> for String {
    fn from(target: CallbackTarget) -> Self {
        target.0
    }
}

/// Policy flags chosen by the caller for one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofingFlags {
    /// Consult the state-record verification vendor.
    pub should_proof_state_id: bool,
    /// Match only the birth year against vendor records.
    pub dob_year_only: bool,
}

/// Everything about a run except the encrypted payload. Immutable once the
/// job starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunParameters {
    pub handle: ResultHandle,
    pub trace_id: TraceId,
    pub flags: ProofingFlags,
    pub callback: CallbackTarget,
}
