//! LMDB implementation of [`ResultStore`].
//!
//! Each entry is `bincode(StoredResult)` under the raw handle bytes. The
//! read-compare-write in [`LmdbResultStore::put`] happens inside a single
//! write transaction, so concurrent writers for the same handle cannot
//! interleave.

use heed::types::Bytes;
use heed::{Database, Env};
use serde::{Deserialize, Serialize};

use idproof_store::{decide_put, PutDecision, ResultStore, StoreError};
use idproof_types::{ResolutionResult, ResultHandle, Timestamp};

use crate::LmdbError;

#[derive(Serialize, Deserialize)]
pub(crate) struct StoredResult {
    pub(crate) written_at: Timestamp,
    pub(crate) result: ResolutionResult,
}

pub struct LmdbResultStore {
    env: Env,
    db: Database<Bytes, Bytes>,
    ttl_secs: u64,
}

impl LmdbResultStore {
    pub(crate) fn new(env: Env, db: Database<Bytes, Bytes>, ttl_secs: u64) -> Self {
        Self { env, db, ttl_secs }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    fn live(&self, stored: StoredResult, now: Timestamp) -> Option<ResolutionResult> {
        if stored.written_at.has_expired(self.ttl_secs, now) {
            None
        } else {
            Some(stored.result)
        }
    }

    pub fn put_at(
        &self,
        handle: &ResultHandle,
        result: &ResolutionResult,
        now: Timestamp,
    ) -> Result<(), LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        let existing = match self.db.get(&wtxn, handle.as_bytes())? {
            Some(bytes) => self.live(bincode::deserialize(bytes)?, now),
            None => None,
        };

        match decide_put(handle, existing.as_ref(), result) {
            Ok(PutDecision::Unchanged) => {
                tracing::debug!(result_id = %handle, "identical result already stored");
                Ok(())
            }
            Ok(PutDecision::Insert) => {
                let encoded = bincode::serialize(&StoredResult {
                    written_at: now,
                    result: result.clone(),
                })?;
                self.db.put(&mut wtxn, handle.as_bytes(), &encoded)?;
                wtxn.commit()?;
                Ok(())
            }
            Err(e) => {
                tracing::error!(result_id = %handle, "refusing conflicting result write");
                Err(LmdbError::Conflict(e.to_string()))
            }
        }
    }

    pub fn get_at(
        &self,
        handle: &ResultHandle,
        now: Timestamp,
    ) -> Result<Option<ResolutionResult>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        match self.db.get(&rtxn, handle.as_bytes())? {
            Some(bytes) => Ok(self.live(bincode::deserialize(bytes)?, now)),
            None => Ok(None),
        }
    }

    /// Remove every entry whose retention period has elapsed at `now`.
    /// Returns the number of entries removed.
    pub fn purge_expired_at(&self, now: Timestamp) -> Result<usize, LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        let mut expired = Vec::new();
        for entry in self.db.iter(&wtxn)? {
            let (key, bytes) = entry?;
            let stale = match bincode::deserialize::<StoredResult>(bytes) {
                Ok(stored) => stored.written_at.has_expired(self.ttl_secs, now),
                Err(_) => true,
            };
            if stale {
                expired.push(key.to_vec());
            }
        }
        for key in &expired {
            self.db.delete(&mut wtxn, key)?;
        }
        wtxn.commit()?;
        Ok(expired.len())
    }

    pub fn purge_expired(&self) -> Result<usize, LmdbError> {
        self.purge_expired_at(Timestamp::now())
    }

    pub fn len(&self) -> Result<u64, LmdbError> {
        let rtxn = self.env.read_txn()?;
        Ok(self.db.len(&rtxn)?)
    }

    pub fn is_empty(&self) -> Result<bool, LmdbError> {
        Ok(self.len()? == 0)
    }
}

impl ResultStore for LmdbResultStore {
    fn put(&self, handle: &ResultHandle, result: &ResolutionResult) -> Result<(), StoreError> {
        self.put_at(handle, result, Timestamp::now())
            .map_err(|e| match e {
                LmdbError::Conflict(_) => StoreError::Conflict(handle.clone()),
                other => other.into(),
            })
    }

    fn get(&self, handle: &ResultHandle) -> Result<Option<ResolutionResult>, StoreError> {
        Ok(self.get_at(handle, Timestamp::now())?)
    }
}
