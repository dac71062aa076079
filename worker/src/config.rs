//! Worker configuration with TOML file support.

use idproof_crypto::{Keyring, PayloadKey};
use idproof_proofing::ProofingSettings;
use idproof_types::{Secret, Timestamp};
use idproof_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::WorkerConfigError;

/// Configuration for an idproof worker.
///
/// Loaded from a TOML file via [`WorkerConfig::from_toml_file`] or built
/// programmatically (e.g. for tests). CLI flags override file values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Address of the intake/read HTTP endpoint.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Directory of the LMDB result store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// How long a stored result stays retrievable.
    #[serde(default = "default_result_ttl_secs")]
    pub result_ttl_secs: u64,

    /// Number of concurrent proofing runs.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Jobs accepted but not yet started.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_callback_timeout_ms")]
    pub callback_timeout_ms: u64,

    /// Keys the applicant payload may be sealed under.
    #[serde(default)]
    pub payload_keys: Vec<PayloadKeyConfig>,

    #[serde(default)]
    pub proofing: ProofingSettings,
}

/// One payload decryption key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PayloadKeyConfig {
    pub id: String,
    /// 32-byte key, hex encoded.
    pub key: Secret,
    /// Unix seconds after which payloads under this key are refused.
    #[serde(default)]
    pub not_after: Option<u64>,
    /// Key used by `encrypt`. Defaults to the first listed key.
    #[serde(default)]
    pub primary: bool,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 7080))
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./idproof_data")
}

fn default_map_size() -> usize {
    idproof_store_lmdb::DEFAULT_MAP_SIZE
}

fn default_result_ttl_secs() -> u64 {
    86_400
}

fn default_worker_count() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    256
}

fn default_callback_timeout_ms() -> u64 {
    10_000
}

// ── Impl ───────────────────────────────────────────────────────────────

impl WorkerConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, WorkerConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| WorkerConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, WorkerConfigError> {
        toml::from_str(s).map_err(|e| WorkerConfigError::Parse(e.to_string()))
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), WorkerConfigError> {
        if self.worker_count == 0 {
            return Err(WorkerConfigError::InvalidValue {
                field: "worker_count",
                reason: "must be at least 1",
            });
        }
        if self.queue_capacity == 0 {
            return Err(WorkerConfigError::InvalidValue {
                field: "queue_capacity",
                reason: "must be at least 1",
            });
        }
        if self.callback_timeout_ms == 0 {
            return Err(WorkerConfigError::InvalidValue {
                field: "callback_timeout_ms",
                reason: "must be greater than zero",
            });
        }
        self.proofing.validate()?;
        Ok(())
    }

    /// Build the decryption keyring from `payload_keys`.
    pub fn keyring(&self) -> Result<Keyring, WorkerConfigError> {
        if self.payload_keys.is_empty() {
            return Err(WorkerConfigError::NoPayloadKeys);
        }
        let mut keyring = Keyring::new();
        for entry in &self.payload_keys {
            keyring.insert(PayloadKey::from_hex(
                entry.id.as_str(),
                entry.key.expose(),
                entry.not_after.map(Timestamp::new),
            )?)?;
        }
        if let Some(primary) = self.payload_keys.iter().find(|k| k.primary) {
            keyring.set_primary(&primary.id)?;
        }
        Ok(keyring)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            listen_addr: default_listen_addr(),
            data_dir: default_data_dir(),
            map_size: default_map_size(),
            result_ttl_secs: default_result_ttl_secs(),
            worker_count: default_worker_count(),
            queue_capacity: default_queue_capacity(),
            callback_timeout_ms: default_callback_timeout_ms(),
            payload_keys: Vec::new(),
            proofing: ProofingSettings::default(),
        }
    }
}
