//! Errors raised while constructing validated types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("date of birth must be formatted YYYY-MM-DD")]
    DateFormat,

    #[error("date of birth is not a calendar date")]
    DateOutOfRange,

    #[error("result handle must be non-empty and at most {max} characters")]
    InvalidHandle { max: usize },

    #[error("callback target must be an http(s) URL")]
    InvalidCallbackTarget,
}
