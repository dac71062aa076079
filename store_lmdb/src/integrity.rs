//! LMDB result-store integrity checks.
//!
//! Run on startup to detect corruption early, before the worker begins
//! accepting jobs.

use heed::types::Bytes;
use idproof_types::Timestamp;

use crate::environment::RESULTS_DB;
use crate::results::StoredResult;
use crate::{LmdbEnvironment, LmdbError};

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub total_entries: u64,
    /// Entries past their retention period, awaiting purge.
    pub expired_entries: u64,
    /// Keys (as lossy UTF-8) whose value could not be decoded, or whose
    /// stored handle does not match the key.
    pub corrupt_keys: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.corrupt_keys.is_empty()
    }
}

/// Scan every stored result and verify it decodes under its own handle.
///
/// Decode failures are recorded in the report rather than causing a hard
/// error; only a failure to read the database at all is returned as `Err`.
pub fn check_integrity(
    environment: &LmdbEnvironment,
    ttl_secs: u64,
    now: Timestamp,
) -> Result<IntegrityReport, LmdbError> {
    let env = environment.env();
    let rtxn = env.read_txn()?;
    let mut report = IntegrityReport::default();

    let Some(db) = env.open_database::<Bytes, Bytes>(&rtxn, Some(RESULTS_DB))? else {
        return Ok(report);
    };

    for entry in db.iter(&rtxn)? {
        let (key, bytes) = entry?;
        report.total_entries += 1;
        match bincode::deserialize::<StoredResult>(bytes) {
            Ok(stored) if stored.result.handle.as_bytes() == key => {
                if stored.written_at.has_expired(ttl_secs, now) {
                    report.expired_entries += 1;
                }
            }
            _ => report
                .corrupt_keys
                .push(String::from_utf8_lossy(key).into_owned()),
        }
    }

    if !report.is_healthy() {
        tracing::warn!(
            corrupt = report.corrupt_keys.len(),
            total = report.total_entries,
            "result store integrity check found undecodable entries"
        );
    }
    Ok(report)
}
