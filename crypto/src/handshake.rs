//! Ed25519-signed handshake for certificate-mode vendor authentication.
//!
//! The client proves possession of its signing key by signing
//! `idproof-auth:<unix seconds>`. The vendor answers with a short-lived
//! bearer token.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use idproof_types::{Secret, Timestamp};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::HandshakeError;

/// Domain separation prefix for handshake messages.
pub const HANDSHAKE_CONTEXT: &str = "idproof-auth";

/// The body POSTed to the vendor's authentication endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeProof {
    /// Hex-encoded Ed25519 public key.
    pub public_key: String,
    pub timestamp: u64,
    /// Hex-encoded Ed25519 signature over [`handshake_message`].
    pub signature: String,
}

pub fn handshake_message(timestamp: u64) -> Vec<u8> {
    format!("{HANDSHAKE_CONTEXT}:{timestamp}").into_bytes()
}

fn signing_key(seed_hex: &Secret) -> Result<SigningKey, HandshakeError> {
    let bytes = Zeroizing::new(
        hex::decode(seed_hex.expose().trim()).map_err(|_| HandshakeError::InvalidSigningKey)?,
    );
    let seed: Zeroizing<[u8; 32]> = Zeroizing::new(
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| HandshakeError::InvalidSigningKey)?,
    );
    Ok(SigningKey::from_bytes(&seed))
}

/// Derive the hex public key for a hex signing seed.
pub fn public_key_hex(seed_hex: &Secret) -> Result<String, HandshakeError> {
    Ok(hex::encode(signing_key(seed_hex)?.verifying_key().to_bytes()))
}

/// Sign a handshake for `timestamp`.
///
/// When `expected_public_key` is given it must match the key derived from
/// the seed, so a mis-paired key configuration is caught before any request.
pub fn sign_handshake(
    seed_hex: &Secret,
    expected_public_key: Option<&str>,
    timestamp: Timestamp,
) -> Result<HandshakeProof, HandshakeError> {
    let key = signing_key(seed_hex)?;
    let public_key = hex::encode(key.verifying_key().to_bytes());
    if let Some(expected) = expected_public_key {
        if !expected.trim().eq_ignore_ascii_case(&public_key) {
            return Err(HandshakeError::PublicKeyMismatch);
        }
    }
    let signature = key.sign(&handshake_message(timestamp.as_secs()));
    Ok(HandshakeProof {
        public_key,
        timestamp: timestamp.as_secs(),
        signature: hex::encode(signature.to_bytes()),
    })
}

/// Verify a handshake proof. Rejects malformed keys and signatures.
pub fn verify_handshake(proof: &HandshakeProof) -> bool {
    let Ok(pk_bytes) = hex::decode(&proof.public_key) else {
        return false;
    };
    let Ok(pk_bytes) = <[u8; 32]>::try_from(pk_bytes.as_slice()) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&pk_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(&proof.signature) else {
        return false;
    };
    let Ok(sig_bytes) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_bytes);
    verifying_key
        .verify(&handshake_message(proof.timestamp), &signature)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> Secret {
        Secret::new(hex::encode([42u8; 32]))
    }

    #[test]
    fn sign_and_verify() {
        let proof = sign_handshake(&seed(), None, Timestamp::new(1_700_000_000)).unwrap();
        assert_eq!(proof.timestamp, 1_700_000_000);
        assert!(verify_handshake(&proof));
    }

    #[test]
    fn signature_is_deterministic() {
        let a = sign_handshake(&seed(), None, Timestamp::new(5)).unwrap();
        let b = sign_handshake(&seed(), None, Timestamp::new(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn altered_timestamp_fails_verification() {
        let mut proof = sign_handshake(&seed(), None, Timestamp::new(5)).unwrap();
        proof.timestamp = 6;
        assert!(!verify_handshake(&proof));
    }

    #[test]
    fn public_key_must_match_seed() {
        let pk = public_key_hex(&seed()).unwrap();
        assert!(sign_handshake(&seed(), Some(&pk.to_uppercase()), Timestamp::new(1)).is_ok());
        assert_eq!(
            sign_handshake(&seed(), Some(&"00".repeat(32)), Timestamp::new(1)),
            Err(HandshakeError::PublicKeyMismatch)
        );
    }

    #[test]
    fn invalid_seed_is_rejected() {
        assert_eq!(
            public_key_hex(&Secret::new("abcd")),
            Err(HandshakeError::InvalidSigningKey)
        );
    }

    #[test]
    fn garbage_proof_does_not_verify() {
        let proof = HandshakeProof {
            public_key: "zz".into(),
            timestamp: 1,
            signature: "00".into(),
        };
        assert!(!verify_handshake(&proof));
    }
}
