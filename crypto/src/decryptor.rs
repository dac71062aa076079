//! Recovers the structured applicant payload from an encrypted job argument.

use idproof_types::{ApplicantIdentity, Timestamp};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{open_envelope, seal_envelope, DecryptionError, KeyError, Keyring};

#[derive(Deserialize)]
struct DecryptedArguments {
    applicant_pii: ApplicantIdentity,
}

#[derive(Serialize)]
struct SealedArguments<'a> {
    applicant_pii: &'a ApplicantIdentity,
}

/// Decrypts `encrypted_arguments` into an [`ApplicantIdentity`].
///
/// Pure apart from reading the clock for key expiry.
#[derive(Clone, Debug)]
pub struct PayloadDecryptor {
    keyring: Keyring,
}

impl PayloadDecryptor {
    pub fn new(keyring: Keyring) -> Self {
        Self { keyring }
    }

    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    pub fn decrypt(&self, encrypted: &str) -> Result<ApplicantIdentity, DecryptionError> {
        self.decrypt_at(encrypted, Timestamp::now())
    }

    pub fn decrypt_at(
        &self,
        encrypted: &str,
        now: Timestamp,
    ) -> Result<ApplicantIdentity, DecryptionError> {
        let plaintext = open_envelope(encrypted, &self.keyring, now)?;
        let args: DecryptedArguments = serde_json::from_slice(&plaintext)
            .map_err(|e| DecryptionError::from_json(&e))?;
        Ok(args.applicant_pii)
    }

    /// Seal an applicant under the primary key.
    pub fn encrypt(&self, identity: &ApplicantIdentity) -> Result<String, KeyError> {
        let key = self.keyring.primary().ok_or(KeyError::NoPrimaryKey)?;
        let plaintext = Zeroizing::new(
            serde_json::to_vec(&SealedArguments {
                applicant_pii: identity,
            })
            .map_err(|_| KeyError::SealFailed)?,
        );
        seal_envelope(&plaintext, key)
    }
}
