use idproof_types::{ReasonCode, VendorId, VendorOutcome};
use thiserror::Error;

/// Why a vendor call produced no verdict. Never escapes an adapter: it is
/// folded into a `Timeout` or `Error` outcome by [`VendorError::into_outcome`].
#[derive(Debug, Error)]
pub enum VendorError {
    #[error("request timed out")]
    Timeout,

    /// Detail is the I/O error kind when one is available.
    #[error("connection failed: {0}")]
    Connect(&'static str),

    #[error("vendor responded with HTTP status {0}")]
    Status(u16),

    /// Position and serde category only; the body is never kept.
    #[error("malformed vendor response ({category} at line {line}, column {column})")]
    MalformedResponse {
        category: &'static str,
        line: usize,
        column: usize,
    },

    #[error("authentication handshake failed: {0}")]
    Handshake(String),

    /// Detail is the transport error kind (`body`, `decode`, `redirect`, ...).
    #[error("request failed: {0}")]
    Request(&'static str),

    #[error("configuration is for vendor {0}")]
    ConfigMismatch(VendorId),
}

impl VendorError {
    /// Reason code recorded on the outcome.
    pub fn reason(&self) -> ReasonCode {
        match self {
            Self::Timeout => ReasonCode::new("timeout"),
            Self::Connect(kind) => ReasonCode::with_detail("connection_failed", kind),
            Self::Status(code) => ReasonCode::with_detail("http_status", code),
            Self::MalformedResponse {
                category,
                line,
                column,
            } => ReasonCode::with_detail("malformed_response", format!("{category}:{line}:{column}")),
            Self::Handshake(detail) => ReasonCode::with_detail("handshake_failed", detail),
            Self::Request(kind) => ReasonCode::with_detail("request_failed", kind),
            Self::ConfigMismatch(other) => ReasonCode::with_detail("config_mismatch", other),
        }
    }

    pub(crate) fn from_json(e: &serde_json::Error) -> Self {
        let category = match e.classify() {
            serde_json::error::Category::Io => "io",
            serde_json::error::Category::Syntax => "syntax",
            serde_json::error::Category::Data => "data",
            serde_json::error::Category::Eof => "eof",
        };
        Self::MalformedResponse {
            category,
            line: e.line(),
            column: e.column(),
        }
    }

    pub fn into_outcome(self, vendor: VendorId) -> VendorOutcome {
        match self {
            Self::Timeout => VendorOutcome::timeout(vendor, self.reason()),
            _ => VendorOutcome::error(vendor, self.reason()),
        }
    }
}
