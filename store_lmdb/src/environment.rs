//! LMDB environment setup.

use std::path::{Path, PathBuf};

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::{LmdbError, LmdbResultStore};

/// Name of the database holding resolution results.
pub const RESULTS_DB: &str = "results";

/// Number of named databases the environment is opened with.
const MAX_DBS: u32 = 4;

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and all database handles.
#[derive(Clone)]
pub struct LmdbEnvironment {
    env: Env,
    results_db: Database<Bytes, Bytes>,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment directory is owned by this process; no
        // other code opens it with different flags.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let results_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(RESULTS_DB))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), "opened LMDB environment");
        Ok(Self {
            env,
            results_db,
            path: path.to_path_buf(),
        })
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A result store whose entries expire `ttl_secs` after being written.
    pub fn result_store(&self, ttl_secs: u64) -> LmdbResultStore {
        LmdbResultStore::new(self.env.clone(), self.results_db, ttl_secs)
    }
}
