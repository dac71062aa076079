use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Conflict(String),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<LmdbError> for idproof_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::Serialization(msg) => idproof_store::StoreError::Serialization(msg),
            other => idproof_store::StoreError::Backend(other.to_string()),
        }
    }
}
