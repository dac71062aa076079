//! Vendor Config Resolver.
//!
//! Pure planning: given the process-wide settings and a run's flags, decide
//! which vendors take part and build their configs. No network I/O, and no
//! per-run failure mode: settings were validated when the resolver was
//! created.

use idproof_types::{ExcludedVendor, ProofingFlags, ReasonCode, VendorId};
use idproof_vendors::{
    CertificateAuth, DobComparison, IdentityServiceConfig, StateRecordAuth, StateRecordConfig,
    VendorConfig,
};
use std::sync::Arc;
use std::time::Duration;

use crate::{ProofingSettings, SettingsError};

/// The vendors taking part in one run, and those planned out.
#[derive(Clone, Debug, Default)]
pub struct VendorPlan {
    pub configs: Vec<VendorConfig>,
    pub excluded: Vec<ExcludedVendor>,
}

impl VendorPlan {
    fn exclude(&mut self, vendor: VendorId, reason: &str) {
        self.excluded.push(ExcludedVendor {
            vendor,
            reason: ReasonCode::new(reason),
        });
    }
}

#[derive(Clone, Debug)]
pub struct VendorConfigResolver {
    settings: Arc<ProofingSettings>,
}

impl VendorConfigResolver {
    pub const VENDOR_DISABLED: &'static str = "vendor_disabled";
    pub const STATE_ID_NOT_REQUESTED: &'static str = "state_id_not_requested";
    pub const CERTIFICATE_UNAVAILABLE: &'static str = "certificate_unavailable";

    pub fn new(settings: ProofingSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            settings: Arc::new(settings),
        })
    }

    pub fn settings(&self) -> &ProofingSettings {
        &self.settings
    }

    /// Build fresh configs for one run.
    pub fn resolve(&self, flags: &ProofingFlags) -> VendorPlan {
        let mut plan = VendorPlan::default();
        self.plan_state_record(flags, &mut plan);
        self.plan_identity_service(flags, &mut plan);
        plan
    }

    fn plan_state_record(&self, flags: &ProofingFlags, plan: &mut VendorPlan) {
        let s = &self.settings.state_record;
        let vendor = VendorId::StateRecord;
        if !s.enabled {
            return plan.exclude(vendor, Self::VENDOR_DISABLED);
        }
        if !flags.should_proof_state_id {
            return plan.exclude(vendor, Self::STATE_ID_NOT_REQUESTED);
        }

        let auth = if s.cert_enabled {
            let Some(private_key) = &s.private_key else {
                return plan.exclude(vendor, Self::CERTIFICATE_UNAVAILABLE);
            };
            // Validated at construction.
            let Ok(public_key) = s.resolved_public_key(private_key) else {
                return plan.exclude(vendor, Self::CERTIFICATE_UNAVAILABLE);
            };
            StateRecordAuth::Certificate(CertificateAuth {
                auth_url: s.auth_url.clone(),
                timeout: Duration::from_millis(s.auth_request_timeout_ms),
                signing_key: private_key.clone(),
                public_key,
            })
        } else {
            StateRecordAuth::Unauthenticated
        };

        plan.configs.push(VendorConfig::StateRecord(StateRecordConfig {
            verification_url: s.verification_url.clone(),
            timeout: Duration::from_millis(s.verification_request_timeout_ms),
            auth,
        }));
    }

    fn plan_identity_service(&self, flags: &ProofingFlags, plan: &mut VendorPlan) {
        let s = &self.settings.identity_service;
        if !s.enabled {
            return plan.exclude(VendorId::IdentityService, Self::VENDOR_DISABLED);
        }

        plan.configs
            .push(VendorConfig::IdentityService(IdentityServiceConfig {
                base_url: s.base_url.clone(),
                account_id: s.account_id.clone(),
                username: s.username.clone(),
                password: s.password.clone(),
                workflow: s.instant_verify_workflow.clone(),
                request_mode: s.request_mode,
                timeout: Duration::from_millis(s.request_timeout_ms),
                dob_comparison: if flags.dob_year_only {
                    DobComparison::YearOnly
                } else {
                    DobComparison::Full
                },
            }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IdentityServiceSettings, StateRecordSettings};
    use idproof_types::Secret;

    const SEED: &str = "0707070707070707070707070707070707070707070707070707070707070707";

    fn settings() -> ProofingSettings {
        ProofingSettings {
            state_record: StateRecordSettings {
                verification_url: "https://records.example/verify".into(),
                ..StateRecordSettings::default()
            },
            identity_service: IdentityServiceSettings {
                base_url: "https://identity.example".into(),
                account_id: "12345".into(),
                username: "svc".into(),
                password: Secret::new("pw"),
                instant_verify_workflow: "customers.instant.verify".into(),
                ..IdentityServiceSettings::default()
            },
        }
    }

    fn flags(state_id: bool, year_only: bool) -> ProofingFlags {
        ProofingFlags {
            should_proof_state_id: state_id,
            dob_year_only: year_only,
        }
    }

    fn vendors(plan: &VendorPlan) -> Vec<VendorId> {
        plan.configs.iter().map(VendorConfig::vendor).collect()
    }

    #[test]
    fn state_record_only_when_requested() {
        let resolver = VendorConfigResolver::new(settings()).unwrap();

        let plan = resolver.resolve(&flags(true, false));
        assert_eq!(vendors(&plan), vec![VendorId::StateRecord, VendorId::IdentityService]);
        assert!(plan.excluded.is_empty());

        let plan = resolver.resolve(&flags(false, false));
        assert_eq!(vendors(&plan), vec![VendorId::IdentityService]);
        assert_eq!(plan.excluded[0].vendor, VendorId::StateRecord);
        assert_eq!(plan.excluded[0].reason.as_str(), "state_id_not_requested");
    }

    #[test]
    fn year_only_flag_selects_year_comparison() {
        let resolver = VendorConfigResolver::new(settings()).unwrap();
        let plan = resolver.resolve(&flags(false, true));
        let VendorConfig::IdentityService(config) = &plan.configs[0] else {
            panic!("expected identity service config");
        };
        assert_eq!(config.dob_comparison, DobComparison::YearOnly);
    }

    #[test]
    fn certificate_mode_without_key_plans_vendor_out() {
        let mut s = settings();
        s.state_record.cert_enabled = true;
        s.state_record.auth_url = "https://records.example/auth".into();
        let resolver = VendorConfigResolver::new(s).unwrap();

        let plan = resolver.resolve(&flags(true, false));
        assert_eq!(vendors(&plan), vec![VendorId::IdentityService]);
        assert_eq!(plan.excluded[0].reason.as_str(), "certificate_unavailable");
    }

    #[test]
    fn certificate_mode_with_key_builds_certificate_auth() {
        let mut s = settings();
        s.state_record.cert_enabled = true;
        s.state_record.auth_url = "https://records.example/auth".into();
        s.state_record.auth_request_timeout_ms = 2_000;
        s.state_record.private_key = Some(Secret::new(SEED));
        let resolver = VendorConfigResolver::new(s).unwrap();

        let plan = resolver.resolve(&flags(true, false));
        let config = &plan.configs[0];
        assert_eq!(config.deadline(), Duration::from_millis(7_000));
        let VendorConfig::StateRecord(c) = config else {
            panic!("expected state record config");
        };
        assert!(c.auth.is_certificate());
    }

    #[test]
    fn disabled_vendors_are_excluded() {
        let mut s = settings();
        s.state_record.enabled = false;
        s.identity_service.enabled = false;
        let resolver = VendorConfigResolver::new(s).unwrap();

        let plan = resolver.resolve(&flags(true, true));
        assert!(plan.configs.is_empty());
        assert_eq!(plan.excluded.len(), 2);
        assert!(plan.excluded.iter().all(|e| e.reason.as_str() == "vendor_disabled"));
    }

    #[test]
    fn invalid_settings_fail_at_construction() {
        let mut s = settings();
        s.identity_service.username.clear();
        assert!(VendorConfigResolver::new(s).is_err());
    }
}
