//! LMDB storage backend for idproof.
//!
//! Implements [`idproof_store::ResultStore`] using the `heed` LMDB bindings.
//! Results live in a single `results` database keyed by result handle,
//! with values bincode-encoded alongside their expiry time.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod results;

pub use environment::{LmdbEnvironment, DEFAULT_MAP_SIZE};
pub use error::LmdbError;
pub use integrity::{check_integrity, IntegrityReport};
pub use results::LmdbResultStore;
