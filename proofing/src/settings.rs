//! Process-wide vendor settings.
//!
//! Loaded once at startup (usually from the worker's TOML file) and handed
//! to the [`VendorConfigResolver`](crate::VendorConfigResolver), which turns
//! them into per-run vendor configs.

use idproof_crypto::{public_key_hex, HandshakeError};
use idproof_types::{Secret, VendorId};
use idproof_vendors::RequestMode;
use serde::{Deserialize, Serialize};

use crate::SettingsError;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProofingSettings {
    #[serde(default)]
    pub state_record: StateRecordSettings,
    #[serde(default)]
    pub identity_service: IdentityServiceSettings,
}

impl ProofingSettings {
    /// Check every mandatory setting of every enabled vendor.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.state_record.validate()?;
        self.identity_service.validate()
    }
}

/// State motor-vehicle record verification.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateRecordSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub verification_url: String,

    #[serde(default = "default_verification_timeout_ms")]
    pub verification_request_timeout_ms: u64,

    /// Require the signed handshake before verification.
    #[serde(default)]
    pub cert_enabled: bool,

    #[serde(default)]
    pub auth_url: String,

    #[serde(default = "default_auth_timeout_ms")]
    pub auth_request_timeout_ms: u64,

    /// Hex Ed25519 seed. When absent in certificate mode, the vendor is
    /// planned out of every run.
    #[serde(default)]
    pub private_key: Option<Secret>,

    /// Hex Ed25519 public key. Derived from `private_key` when absent.
    #[serde(default)]
    pub public_key: Option<String>,
}

impl Default for StateRecordSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            verification_url: String::new(),
            verification_request_timeout_ms: default_verification_timeout_ms(),
            cert_enabled: false,
            auth_url: String::new(),
            auth_request_timeout_ms: default_auth_timeout_ms(),
            private_key: None,
            public_key: None,
        }
    }
}

impl StateRecordSettings {
    const VENDOR: VendorId = VendorId::StateRecord;

    fn validate(&self) -> Result<(), SettingsError> {
        if !self.enabled {
            return Ok(());
        }
        require(Self::VENDOR, "verification_url", &self.verification_url)?;
        require_timeout(
            Self::VENDOR,
            "verification_request_timeout_ms",
            self.verification_request_timeout_ms,
        )?;
        if self.cert_enabled {
            require(Self::VENDOR, "auth_url", &self.auth_url)?;
            require_timeout(
                Self::VENDOR,
                "auth_request_timeout_ms",
                self.auth_request_timeout_ms,
            )?;
        }
        if let Some(private_key) = &self.private_key {
            self.resolved_public_key(private_key)?;
        }
        Ok(())
    }

    /// The public key to present, checked against the configured seed.
    pub fn resolved_public_key(&self, private_key: &Secret) -> Result<String, SettingsError> {
        let derived = public_key_hex(private_key).map_err(|e| invalid_key(&e))?;
        match &self.public_key {
            Some(configured) if !configured.trim().eq_ignore_ascii_case(&derived) => {
                Err(invalid_key(&HandshakeError::PublicKeyMismatch))
            }
            _ => Ok(derived),
        }
    }
}

fn invalid_key(e: &HandshakeError) -> SettingsError {
    SettingsError::InvalidKey {
        vendor: VendorId::StateRecord,
        reason: e.to_string(),
    }
}

/// Commercial identity-verification service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityServiceSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub account_id: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: Secret,

    #[serde(default)]
    pub instant_verify_workflow: String,

    #[serde(default)]
    pub request_mode: RequestMode,

    #[serde(default = "default_identity_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for IdentityServiceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: String::new(),
            account_id: String::new(),
            username: String::new(),
            password: Secret::default(),
            instant_verify_workflow: String::new(),
            request_mode: RequestMode::default(),
            request_timeout_ms: default_identity_timeout_ms(),
        }
    }
}

impl IdentityServiceSettings {
    const VENDOR: VendorId = VendorId::IdentityService;

    fn validate(&self) -> Result<(), SettingsError> {
        if !self.enabled {
            return Ok(());
        }
        require(Self::VENDOR, "base_url", &self.base_url)?;
        require(Self::VENDOR, "account_id", &self.account_id)?;
        require(Self::VENDOR, "username", &self.username)?;
        if self.password.is_empty() {
            return Err(SettingsError::Missing {
                vendor: Self::VENDOR,
                field: "password",
            });
        }
        require(
            Self::VENDOR,
            "instant_verify_workflow",
            &self.instant_verify_workflow,
        )?;
        require_timeout(Self::VENDOR, "request_timeout_ms", self.request_timeout_ms)
    }
}

fn require(vendor: VendorId, field: &'static str, value: &str) -> Result<(), SettingsError> {
    if value.trim().is_empty() {
        Err(SettingsError::Missing { vendor, field })
    } else {
        Ok(())
    }
}

fn require_timeout(vendor: VendorId, field: &'static str, ms: u64) -> Result<(), SettingsError> {
    if ms == 0 {
        Err(SettingsError::ZeroTimeout { vendor, field })
    } else {
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_verification_timeout_ms() -> u64 {
    5_000
}

fn default_auth_timeout_ms() -> u64 {
    5_000
}

fn default_identity_timeout_ms() -> u64 {
    5_000
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "0707070707070707070707070707070707070707070707070707070707070707";

    fn parse(toml_str: &str) -> ProofingSettings {
        toml::from_str(toml_str).unwrap()
    }

    const VALID: &str = r#"
        [state_record]
        verification_url = "https://records.example/verify"

        [identity_service]
        base_url = "https://identity.example"
        account_id = "12345"
        username = "svc"
        password = "pw"
        instant_verify_workflow = "customers.instant.verify"
        request_mode = "testing"
    "#;

    #[test]
    fn defaults_fill_timeouts_and_enable_vendors() {
        let settings = parse(VALID);
        assert!(settings.state_record.enabled);
        assert_eq!(settings.state_record.verification_request_timeout_ms, 5_000);
        assert_eq!(settings.identity_service.request_mode, RequestMode::Testing);
        assert_eq!(settings.validate(), Ok(()));
    }

    #[test]
    fn missing_url_is_reported() {
        let mut settings = parse(VALID);
        settings.identity_service.base_url.clear();
        assert_eq!(
            settings.validate(),
            Err(SettingsError::Missing {
                vendor: VendorId::IdentityService,
                field: "base_url",
            })
        );
    }

    #[test]
    fn disabled_vendor_needs_no_settings() {
        let mut settings = parse(VALID);
        settings.identity_service = IdentityServiceSettings {
            enabled: false,
            ..IdentityServiceSettings::default()
        };
        assert_eq!(settings.validate(), Ok(()));
    }

    #[test]
    fn certificate_mode_requires_auth_url() {
        let mut settings = parse(VALID);
        settings.state_record.cert_enabled = true;
        assert_eq!(
            settings.validate(),
            Err(SettingsError::Missing {
                vendor: VendorId::StateRecord,
                field: "auth_url",
            })
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut settings = parse(VALID);
        settings.state_record.verification_request_timeout_ms = 0;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::ZeroTimeout { .. })
        ));
    }

    #[test]
    fn key_material_must_parse_and_pair() {
        let mut settings = parse(VALID);
        settings.state_record.private_key = Some(Secret::new("not hex"));
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidKey { .. })
        ));

        settings.state_record.private_key = Some(Secret::new(SEED));
        settings.state_record.public_key = Some("00".repeat(32));
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidKey { .. })
        ));

        settings.state_record.public_key = None;
        assert_eq!(settings.validate(), Ok(()));
    }
}
