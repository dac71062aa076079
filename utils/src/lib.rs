//! Shared utilities for idproof.

pub mod logging;
pub mod time;

pub use logging::{init_logging, LogFormat, LoggingError};
pub use time::format_duration;
