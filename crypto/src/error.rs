use thiserror::Error;

/// Failure to recover an applicant payload. Fatal to the run.
///
/// No variant carries plaintext: JSON errors are reduced to their
/// category and position.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecryptionError {
    #[error("malformed envelope: {0}")]
    Malformed(&'static str),

    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u8),

    #[error("no key loaded with id {0}")]
    UnknownKey(String),

    #[error("key {0} has expired")]
    KeyExpired(String),

    #[error("authentication check failed")]
    AuthenticationFailed,

    #[error("payload is not an applicant record ({category} error at line {line}, column {column})")]
    InvalidPayload {
        category: &'static str,
        line: usize,
        column: usize,
    },
}

impl DecryptionError {
    pub(crate) fn from_json(e: &serde_json::Error) -> Self {
        let category = match e.classify() {
            serde_json::error::Category::Io => "io",
            serde_json::error::Category::Syntax => "syntax",
            serde_json::error::Category::Data => "data",
            serde_json::error::Category::Eof => "eof",
        };
        Self::InvalidPayload {
            category,
            line: e.line(),
            column: e.column(),
        }
    }
}

/// Invalid key material supplied through configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("key id must be 1-255 bytes")]
    InvalidId,

    #[error("key {0} must be 32 bytes of hex")]
    InvalidMaterial(String),

    #[error("duplicate key id {0}")]
    Duplicate(String),

    #[error("no key loaded with id {0}")]
    UnknownKey(String),

    #[error("no primary key loaded")]
    NoPrimaryKey,

    #[error("payload could not be sealed")]
    SealFailed,
}

/// Failure to produce a signed handshake.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("signing key must be a 32-byte hex seed")]
    InvalidSigningKey,

    #[error("configured public key does not match the signing key")]
    PublicKeyMismatch,
}
