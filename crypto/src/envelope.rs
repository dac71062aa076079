//! AES-256-GCM payload envelopes.
//!
//! Wire layout, hex-encoded for transport through the job queue:
//!
//! ```text
//! version (1) | key_id_len (1) | key_id (key_id_len) | nonce (12) | ciphertext + tag
//! ```
//!
//! The key id is authenticated as associated data, so an envelope cannot be
//! re-labelled to point at a different key.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use idproof_types::Timestamp;
use zeroize::Zeroizing;

use crate::{DecryptionError, KeyError, Keyring, PayloadKey};

/// Current envelope format version.
pub const ENVELOPE_VERSION: u8 = 1;

/// AES-GCM nonce length in bytes (96 bits).
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
const TAG_LEN: usize = 16;

fn cipher_for(key: &PayloadKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.material()))
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
pub fn seal_envelope(plaintext: &[u8], key: &PayloadKey) -> Result<String, KeyError> {
    let key_id = key.id().as_bytes();
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher_for(key)
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad: key_id,
            },
        )
        .map_err(|_| KeyError::SealFailed)?;

    let mut out = Vec::with_capacity(2 + key_id.len() + NONCE_LEN + ciphertext.len());
    out.push(ENVELOPE_VERSION);
    out.push(key_id.len() as u8);
    out.extend_from_slice(key_id);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(hex::encode(out))
}

/// Decrypt an envelope produced by [`seal_envelope`].
///
/// The key named in the envelope must be present in `keyring` and not
/// expired at `now`.
pub fn open_envelope(
    encoded: &str,
    keyring: &Keyring,
    now: Timestamp,
) -> Result<Zeroizing<Vec<u8>>, DecryptionError> {
    let raw = hex::decode(encoded.trim()).map_err(|_| DecryptionError::Malformed("not hex"))?;

    let (&version, rest) = raw
        .split_first()
        .ok_or(DecryptionError::Malformed("empty envelope"))?;
    if version != ENVELOPE_VERSION {
        return Err(DecryptionError::UnsupportedVersion(version));
    }

    let (&id_len, rest) = rest
        .split_first()
        .ok_or(DecryptionError::Malformed("missing key id"))?;
    let id_len = id_len as usize;
    if id_len == 0 || rest.len() < id_len + NONCE_LEN + TAG_LEN {
        return Err(DecryptionError::Malformed("truncated envelope"));
    }
    let (key_id, rest) = rest.split_at(id_len);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let key_id =
        std::str::from_utf8(key_id).map_err(|_| DecryptionError::Malformed("key id not utf-8"))?;
    let key = keyring
        .get(key_id)
        .ok_or_else(|| DecryptionError::UnknownKey(key_id.to_string()))?;
    if key.is_expired(now) {
        return Err(DecryptionError::KeyExpired(key_id.to_string()));
    }

    let plaintext = cipher_for(key)
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: key_id.as_bytes(),
            },
        )
        .map_err(|_| DecryptionError::AuthenticationFailed)?;
    Ok(Zeroizing::new(plaintext))
}
