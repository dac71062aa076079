use idproof_crypto::KeyError;
use idproof_proofing::SettingsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerConfigError {
    #[error("cannot read config file: {0}")]
    Io(String),

    #[error("invalid config file: {0}")]
    Parse(String),

    #[error("no payload keys configured")]
    NoPayloadKeys,

    #[error("payload key error: {0}")]
    Key(#[from] KeyError),

    #[error("vendor settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("`{field}` {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}
