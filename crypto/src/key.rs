//! Symmetric key material for payload envelopes.

use crate::KeyError;
use idproof_types::Timestamp;
use std::collections::HashMap;
use std::fmt;
use zeroize::Zeroizing;

/// Key length for AES-256-GCM.
pub const KEY_LEN: usize = 32;

/// A named 32-byte AES-256-GCM key with an optional expiry.
#[derive(Clone)]
pub struct PayloadKey {
    id: String,
    material: Zeroizing<[u8; KEY_LEN]>,
    not_after: Option<Timestamp>,
}

impl PayloadKey {
    pub fn new(
        id: impl Into<String>,
        material: [u8; KEY_LEN],
        not_after: Option<Timestamp>,
    ) -> Result<Self, KeyError> {
        let id = id.into();
        if id.is_empty() || id.len() > u8::MAX as usize {
            return Err(KeyError::InvalidId);
        }
        Ok(Self {
            id,
            material: Zeroizing::new(material),
            not_after,
        })
    }

    /// Parse key material from a 64-character hex string.
    pub fn from_hex(
        id: impl Into<String>,
        key_hex: &str,
        not_after: Option<Timestamp>,
    ) -> Result<Self, KeyError> {
        let id = id.into();
        let bytes = Zeroizing::new(
            hex::decode(key_hex.trim()).map_err(|_| KeyError::InvalidMaterial(id.clone()))?,
        );
        let material: [u8; KEY_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidMaterial(id.clone()))?;
        Self::new(id, material, not_after)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn not_after(&self) -> Option<Timestamp> {
        self.not_after
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.not_after.is_some_and(|limit| now > limit)
    }

    pub(crate) fn material(&self) -> &[u8; KEY_LEN] {
        &self.material
    }
}

impl fmt::Debug for PayloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadKey")
            .field("id", &self.id)
            .field("not_after", &self.not_after)
            .finish_non_exhaustive()
    }
}

/// All payload keys loaded for this process.
///
/// Several keys can be live at once so that envelopes sealed before a
/// rotation still open. The primary key is the one new envelopes use.
#[derive(Clone, Debug, Default)]
pub struct Keyring {
    keys: HashMap<String, PayloadKey>,
    primary: Option<String>,
}

impl Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key. The first key added becomes the primary key.
    pub fn insert(&mut self, key: PayloadKey) -> Result<(), KeyError> {
        if self.keys.contains_key(key.id()) {
            return Err(KeyError::Duplicate(key.id().to_string()));
        }
        if self.primary.is_none() {
            self.primary = Some(key.id().to_string());
        }
        self.keys.insert(key.id().to_string(), key);
        Ok(())
    }

    pub fn with_key(mut self, key: PayloadKey) -> Result<Self, KeyError> {
        self.insert(key)?;
        Ok(self)
    }

    pub fn set_primary(&mut self, id: &str) -> Result<(), KeyError> {
        if !self.keys.contains_key(id) {
            return Err(KeyError::UnknownKey(id.to_string()));
        }
        self.primary = Some(id.to_string());
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&PayloadKey> {
        self.keys.get(id)
    }

    pub fn primary(&self) -> Option<&PayloadKey> {
        self.primary.as_deref().and_then(|id| self.keys.get(id))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
